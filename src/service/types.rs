use serde::{Deserialize, Serialize};

/// POST /api/session body
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub voice_persona: String,
    pub session_type: String,
    pub duration_minutes: u32,
    pub ambient_category: Option<String>,
}

/// POST /api/session response (fields beyond the id are informational)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: String,
    #[serde(default)]
    pub voice_persona: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
}

/// POST /api/generate-speech body
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub message: String,
    pub voice_persona: String,
}

/// POST /api/generate-speech response
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechResponse {
    /// Base64-encoded audio, empty when the backend failed to synthesize
    pub audio_data: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub voice_persona: Option<String>,
}

/// A track returned by the music lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
}

/// GET /api/music/{category} response
#[derive(Debug, Serialize, Deserialize)]
pub struct MusicResponse {
    pub category: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}
