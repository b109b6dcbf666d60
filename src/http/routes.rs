use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalogs
        .route("/personas", get(handlers::list_personas))
        .route("/sounds", get(handlers::list_sounds))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/messages", get(handlers::get_messages))
        // Setup screens
        .route("/session/persona", post(handlers::select_persona))
        .route("/session/persona/confirm", post(handlers::confirm_persona))
        .route("/session/duration", post(handlers::adjust_duration))
        // Session lifecycle
        .route("/session/start", post(handlers::start_session))
        .route("/session/end", post(handlers::end_session))
        // Meditation
        .route("/session/meditation/open", post(handlers::open_meditation))
        .route("/session/meditation/skip", post(handlers::skip_meditation))
        .route("/session/meditation/sound", post(handlers::select_sound))
        .route("/session/meditation/return", post(handlers::return_to_session))
        // Server-side commands
        .route("/session/breathing", post(handlers::begin_breathing))
        .route("/session/check-in", post(handlers::request_check_in))
        // Speech input
        .route("/session/transcript", post(handlers::push_transcript))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
