use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::machine::Orchestrator;
use crate::catalog::Direction;
use crate::error::OrchestratorError;
use crate::session::SessionSnapshot;

/// Operations the presentation layer can request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectPersona { direction: Direction },
    ConfirmPersona,
    AdjustDuration { delta_minutes: i32 },
    StartSession,
    EndSession,
    OpenMeditationMenu,
    SkipMeditation,
    SelectSound { sound_id: String },
    ReturnToSession,
    BeginBreathing,
    RequestCheckIn,
}

pub(super) struct Request {
    pub(super) command: Command,
    pub(super) reply: oneshot::Sender<Result<SessionSnapshot, OrchestratorError>>,
}

/// Cloneable handle to a running orchestrator
#[derive(Clone)]
pub struct OrchestratorHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl OrchestratorHandle {
    /// Run one command and return the state right after it was applied
    pub async fn execute(&self, command: Command) -> Result<SessionSnapshot, OrchestratorError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Request { command, reply })
            .await
            .map_err(|_| OrchestratorError::Stopped)?;
        response.await.map_err(|_| OrchestratorError::Stopped)?
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

impl Orchestrator {
    /// Apply one presentation command
    pub async fn apply(&mut self, command: Command) -> Result<(), OrchestratorError> {
        match command {
            Command::SelectPersona { direction } => self.select_persona(direction).map(|_| ()),
            Command::ConfirmPersona => self.confirm_persona(),
            Command::AdjustDuration { delta_minutes } => {
                self.adjust_duration(delta_minutes).map(|_| ())
            }
            Command::StartSession => self.start_session().await,
            Command::EndSession => self.end_session().await,
            Command::OpenMeditationMenu => self.open_meditation_menu(),
            Command::SkipMeditation => self.skip_meditation(),
            Command::SelectSound { sound_id } => self.select_sound(&sound_id).map(|_| ()),
            Command::ReturnToSession => self.return_to_session(),
            Command::BeginBreathing => self.begin_breathing(),
            Command::RequestCheckIn => self.request_check_in(),
        }
    }

    /// Move the orchestrator onto its own task
    pub fn spawn(self) -> (OrchestratorHandle, JoinHandle<()>) {
        let (requests, requests_rx) = mpsc::channel(32);
        let (snapshots_tx, snapshots) = watch::channel(self.snapshot());

        let task = tokio::spawn(self.run(requests_rx, snapshots_tx));

        (OrchestratorHandle { requests, snapshots }, task)
    }
}
