use super::state::AppState;
use crate::catalog::Direction;
use crate::error::OrchestratorError;
use crate::orchestrator::Command;
use crate::transcript::SpeechFragment;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectPersonaRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct AdjustDurationRequest {
    /// Signed change in minutes; the result is clamped to 5..=60
    pub delta_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct SelectSoundRequest {
    pub sound_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn status_for(err: &OrchestratorError) -> StatusCode {
    match err {
        OrchestratorError::InvalidTransition { .. } | OrchestratorError::SessionNotActive => {
            StatusCode::CONFLICT
        }
        OrchestratorError::UnknownSound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::Service(_)
        | OrchestratorError::Channel(_)
        | OrchestratorError::Speech(_) => StatusCode::BAD_GATEWAY,
        OrchestratorError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Run one command and answer with the resulting snapshot
async fn execute(state: &AppState, command: Command) -> Response {
    match state.orchestrator.execute(command).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Command failed: {}", e);
            } else {
                warn!("Command rejected: {}", e);
            }
            error_response(status, e.to_string())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /personas
pub async fn list_personas(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.personas.all().to_vec()))
}

/// GET /sounds
pub async fn list_sounds(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.sounds.all().to_vec()))
}

/// GET /session
/// Latest orchestrator snapshot
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.orchestrator.snapshot()))
}

/// GET /session/messages
pub async fn get_messages(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.orchestrator.snapshot().messages))
}

/// POST /session/persona
pub async fn select_persona(
    State(state): State<AppState>,
    Json(req): Json<SelectPersonaRequest>,
) -> Response {
    execute(
        &state,
        Command::SelectPersona {
            direction: req.direction,
        },
    )
    .await
}

/// POST /session/persona/confirm
pub async fn confirm_persona(State(state): State<AppState>) -> Response {
    execute(&state, Command::ConfirmPersona).await
}

/// POST /session/duration
pub async fn adjust_duration(
    State(state): State<AppState>,
    Json(req): Json<AdjustDurationRequest>,
) -> Response {
    execute(
        &state,
        Command::AdjustDuration {
            delta_minutes: req.delta_minutes,
        },
    )
    .await
}

/// POST /session/start
pub async fn start_session(State(state): State<AppState>) -> Response {
    info!("Session start requested");
    execute(&state, Command::StartSession).await
}

/// POST /session/end
pub async fn end_session(State(state): State<AppState>) -> Response {
    info!("Session end requested");
    execute(&state, Command::EndSession).await
}

/// POST /session/meditation/open
pub async fn open_meditation(State(state): State<AppState>) -> Response {
    execute(&state, Command::OpenMeditationMenu).await
}

/// POST /session/meditation/skip
pub async fn skip_meditation(State(state): State<AppState>) -> Response {
    execute(&state, Command::SkipMeditation).await
}

/// POST /session/meditation/sound
pub async fn select_sound(
    State(state): State<AppState>,
    Json(req): Json<SelectSoundRequest>,
) -> Response {
    execute(
        &state,
        Command::SelectSound {
            sound_id: req.sound_id,
        },
    )
    .await
}

/// POST /session/meditation/return
pub async fn return_to_session(State(state): State<AppState>) -> Response {
    execute(&state, Command::ReturnToSession).await
}

/// POST /session/breathing
pub async fn begin_breathing(State(state): State<AppState>) -> Response {
    execute(&state, Command::BeginBreathing).await
}

/// POST /session/check-in
pub async fn request_check_in(State(state): State<AppState>) -> Response {
    execute(&state, Command::RequestCheckIn).await
}

/// POST /session/transcript
/// Feed one recognizer fragment into speech capture
pub async fn push_transcript(
    State(state): State<AppState>,
    Json(fragment): Json<SpeechFragment>,
) -> Response {
    let Some(feed) = &state.speech_feed else {
        return error_response(
            StatusCode::CONFLICT,
            "Speech input is read from stdin; transcript push is disabled".to_string(),
        );
    };

    if feed.push(fragment).await {
        StatusCode::ACCEPTED.into_response()
    } else {
        error_response(
            StatusCode::CONFLICT,
            "Speech capture is not running".to_string(),
        )
    }
}
