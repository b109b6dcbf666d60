use serde::{Deserialize, Serialize};

use super::messages::Message;
use super::session::{Session, SessionStatus};
use crate::catalog::{MeditationSound, Persona};
use crate::orchestrator::Screen;
use crate::service::Track;

/// Read model of the orchestrator for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Current screen of the state machine
    pub screen: Screen,

    /// Session lifecycle status (inactive when no session exists)
    pub status: SessionStatus,

    /// Index of the highlighted persona
    pub persona_index: usize,

    pub persona: Persona,

    /// Duration configured in the timer setup screen
    pub duration_minutes: u32,

    pub session: Option<Session>,

    pub messages: Vec<Message>,

    pub selected_sound: Option<MeditationSound>,

    /// Tracks found for the selected sound (empty when the lookup failed)
    pub tracks: Vec<Track>,

    /// Whether a clip is currently sounding
    pub playing: bool,
}
