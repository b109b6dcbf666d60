pub mod catalog;
pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod playback;
pub mod policy;
pub mod service;
pub mod session;
pub mod timer;
pub mod transcript;

pub use catalog::{Direction, MeditationSound, Persona, PersonaCatalog, SoundCatalog};
pub use channel::{ChannelAdapter, ChannelNotice, InboundEvent, OutboundCommand, WebSocketTransport};
pub use config::Config;
pub use error::{ChannelError, OrchestratorError, PolicyError, ServiceError, SpeechError};
pub use http::{create_router, AppState};
pub use orchestrator::{Command, Orchestrator, OrchestratorDeps, OrchestratorHandle, Screen};
pub use playback::{DecodedClip, PlaybackQueue, PlaybackSink, SilentSink, WavFileSink};
pub use policy::{ResponsePolicy, SeededDice};
pub use service::{HttpSessionService, SessionService, Track};
pub use session::{Message, MessageKind, Role, Session, SessionConfig, SessionSnapshot, SessionStatus};
pub use timer::SessionTimer;
pub use transcript::{LineSpeechSource, PushSpeechSource, SpeechFeed, SpeechFragment, SpeechSource};
