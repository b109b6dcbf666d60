//! Session service collaborators
//!
//! The orchestrator consumes the session service through [`SessionService`].
//! [`HttpSessionService`] talks to the meditation backend over HTTP.

mod client;
mod types;

pub use client::{HttpSessionService, SessionService};
pub use types::{
    CreateSessionRequest, CreatedSession, MusicResponse, SpeechRequest, SpeechResponse, Track,
};
