use thiserror::Error;

use crate::orchestrator::Screen;

/// Failure talking to the session service (session creation, track lookup, synthesis)
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Speech synthesis, decode, playback or capture failure. Never fatal.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] ServiceError),

    #[error("synthesized clip was empty")]
    EmptyClip,

    #[error("failed to decode clip: {0}")]
    Decode(String),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("speech capture failed: {0}")]
    Capture(String),
}

/// Realtime channel failure
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid realtime url: {0}")]
    InvalidUrl(String),

    #[error("failed to connect realtime channel: {0}")]
    Connect(String),

    #[error("failed to send on realtime channel: {0}")]
    Send(String),

    #[error("realtime channel receive error: {0}")]
    Receive(String),

    #[error("realtime channel is closed")]
    Closed,

    #[error("invalid realtime envelope: {0}")]
    InvalidEnvelope(String),
}

/// Reply generation failure
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("reply generation failed: {0}")]
    Generation(String),
}

/// Errors returned by orchestrator operations to the presentation layer
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("{operation} is not allowed while in {screen}")]
    InvalidTransition {
        operation: &'static str,
        screen: Screen,
    },

    #[error("unknown meditation sound: {0}")]
    UnknownSound(String),

    #[error("no active session")]
    SessionNotActive,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("orchestrator has stopped")]
    Stopped,
}
