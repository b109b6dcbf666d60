use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::types::{
    CreateSessionRequest, CreatedSession, MusicResponse, SpeechRequest, SpeechResponse, Track,
};
use crate::catalog::Persona;
use crate::error::ServiceError;

/// Collaborator contracts consumed by the orchestrator
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Register a session; the returned id keys the realtime channel
    async fn create_session(
        &self,
        persona: &Persona,
        duration_minutes: u32,
    ) -> Result<CreatedSession, ServiceError>;

    /// Synthesize `text` in the persona's voice; returns encoded audio bytes
    async fn synthesize_speech(&self, text: &str, persona: &Persona) -> Result<Vec<u8>, ServiceError>;

    /// Tracks for a meditation sound category
    async fn list_tracks(&self, category: &str) -> Result<Vec<Track>, ServiceError>;
}

/// HTTP client for the meditation backend
#[derive(Clone)]
pub struct HttpSessionService {
    client: Client,
    base_url: String,
}

impl HttpSessionService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ServiceError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl SessionService for HttpSessionService {
    async fn create_session(
        &self,
        persona: &Persona,
        duration_minutes: u32,
    ) -> Result<CreatedSession, ServiceError> {
        let endpoint = self.endpoint("/session");
        let body = CreateSessionRequest {
            voice_persona: persona.id.clone(),
            session_type: "guided_breathing".to_string(),
            duration_minutes,
            ambient_category: None,
        };

        info!("Creating session for {} ({} min)", persona.id, duration_minutes);

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let created: CreatedSession = Self::parse(&endpoint, response).await?;
        if created.id.trim().is_empty() {
            return Err(ServiceError::InvalidResponse {
                endpoint,
                reason: "empty session id".to_string(),
            });
        }

        info!("Session created: {}", created.id);
        Ok(created)
    }

    async fn synthesize_speech(&self, text: &str, persona: &Persona) -> Result<Vec<u8>, ServiceError> {
        let endpoint = self.endpoint("/generate-speech");
        let body = SpeechRequest {
            message: text.to_string(),
            voice_persona: persona.id.clone(),
        };

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let speech: SpeechResponse = Self::parse(&endpoint, response).await?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(speech.audio_data.as_bytes())
            .map_err(|e| ServiceError::InvalidResponse {
                endpoint: endpoint.clone(),
                reason: format!("bad audio_data: {}", e),
            })?;

        if audio.is_empty() {
            return Err(ServiceError::InvalidResponse {
                endpoint,
                reason: "empty audio_data".to_string(),
            });
        }

        debug!("Synthesized {} bytes for {}", audio.len(), persona.voice_id);
        Ok(audio)
    }

    async fn list_tracks(&self, category: &str) -> Result<Vec<Track>, ServiceError> {
        let endpoint = self.endpoint(&format!("/music/{}", category));

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let music: MusicResponse = Self::parse(&endpoint, response).await?;
        info!("Found {} tracks for {}", music.tracks.len(), category);
        Ok(music.tracks)
    }
}
