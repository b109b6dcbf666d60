use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::channel::ChannelNotice;
use crate::error::{ServiceError, SpeechError};
use crate::playback::DecodedClip;
use crate::service::Track;

/// Event pushed into the loop by a background task
#[derive(Debug)]
pub(crate) enum Event {
    Channel { generation: u64, notice: ChannelNotice },
}

/// Result of an in-flight collaborator job
pub(crate) enum JobOutcome {
    Speech {
        generation: u64,
        message_id: Option<Uuid>,
        result: Result<DecodedClip, SpeechError>,
    },
    Tracks {
        generation: u64,
        sound_id: String,
        result: Result<Vec<Track>, ServiceError>,
    },
    Playback {
        generation: u64,
        clip: Arc<DecodedClip>,
        result: Result<(), SpeechError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeferredAction {
    OpenMeditationMenu,
    Reset,
}

/// Action scheduled for a later tick
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deferred {
    pub(crate) due: Instant,
    pub(crate) generation: u64,
    pub(crate) action: DeferredAction,
}
