//! Session orchestrator
//!
//! A finite state machine that owns the session record, the message log,
//! the timers, the playback queue, the realtime channel and speech capture.
//! All state changes happen on one task: presentation commands, channel
//! events, recognizer fragments, collaborator results and timer ticks are
//! applied strictly in the order the loop receives them.
//!
//! Every asynchronous result is tagged with the session generation it was
//! started under and is discarded if the generation moved on.

mod events;
mod handle;
mod machine;
mod state;

pub use handle::{Command, OrchestratorHandle};
pub use machine::{Orchestrator, OrchestratorDeps};
pub use state::Screen;
