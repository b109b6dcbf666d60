use crate::catalog::{PersonaCatalog, SoundCatalog};
use crate::orchestrator::OrchestratorHandle;
use crate::transcript::SpeechFeed;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Handle to the running orchestrator
    pub orchestrator: OrchestratorHandle,

    /// Feed into the push speech source (absent when capture reads stdin)
    pub speech_feed: Option<SpeechFeed>,

    pub personas: Arc<PersonaCatalog>,
    pub sounds: Arc<SoundCatalog>,
}

impl AppState {
    pub fn new(
        orchestrator: OrchestratorHandle,
        speech_feed: Option<SpeechFeed>,
        personas: PersonaCatalog,
        sounds: SoundCatalog,
    ) -> Self {
        Self {
            orchestrator,
            speech_feed,
            personas: Arc::new(personas),
            sounds: Arc::new(sounds),
        }
    }
}
