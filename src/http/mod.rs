//! HTTP control API for the presentation layer
//!
//! Every screen action of the session flow is one POST route; reads return
//! the orchestrator's latest snapshot:
//! - GET /health, /personas, /sounds, /session, /session/messages
//! - POST /session/persona, /session/persona/confirm, /session/duration
//! - POST /session/start, /session/end
//! - POST /session/meditation/{open,skip,sound,return}
//! - POST /session/breathing, /session/check-in
//! - POST /session/transcript - feed recognizer fragments

mod handlers;
mod routes;
mod state;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use state::AppState;
