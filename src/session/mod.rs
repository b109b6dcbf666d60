//! Session-scoped data owned by the orchestrator
//!
//! This module provides:
//! - `Session`: the record created by `start_session` and destroyed on reset
//! - `MessageLog`: the append-only conversation log of the current session
//! - `SessionConfig`: timing and default settings for the session flow
//! - `SessionSnapshot`: the read model handed to the presentation layer

mod config;
mod messages;
mod session;
mod stats;

pub use config::SessionConfig;
pub use messages::{Message, MessageKind, MessageLog, Role, SpeechState};
pub use session::{clamp_minutes, Session, SessionStatus, MAX_MINUTES, MIN_MINUTES};
pub use stats::SessionSnapshot;
