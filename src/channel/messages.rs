use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// JSON envelope pushed by the server
#[derive(Debug, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Reply text of a server-side conversation turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Base64-encoded audio clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Typed inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    AudioClip(Vec<u8>),
    MeditationSuggested { message: Option<String> },
    CheckInRequest { message: Option<String> },
    Text { text: String },
}

impl InboundEnvelope {
    /// Decode the envelope into events: the textual event first, then its audio clip
    pub fn into_events(self) -> Result<Vec<InboundEvent>, ChannelError> {
        let mut events = Vec::new();
        let text = self.message.or(self.response).filter(|t| !t.trim().is_empty());

        match self.kind.as_str() {
            "audio" => {}
            "meditation_suggested" => events.push(InboundEvent::MeditationSuggested { message: text }),
            "check_in" => events.push(InboundEvent::CheckInRequest { message: text }),
            "text" | "speech" | "conversation" | "breathing_exercise" | "session_end" => {
                if let Some(text) = text {
                    events.push(InboundEvent::Text { text });
                }
            }
            other => {
                return Err(ChannelError::InvalidEnvelope(format!(
                    "unknown event type '{}'",
                    other
                )))
            }
        }

        if let Some(audio) = self.audio.filter(|a| !a.is_empty()) {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(audio.as_bytes())
                .map_err(|e| ChannelError::InvalidEnvelope(format!("bad audio payload: {}", e)))?;
            if !bytes.is_empty() {
                events.push(InboundEvent::AudioClip(bytes));
            }
        }

        Ok(events)
    }
}

/// Parse a text frame into inbound events
pub fn parse_inbound(payload: &str) -> Result<Vec<InboundEvent>, ChannelError> {
    let envelope: InboundEnvelope = serde_json::from_str(payload)
        .map_err(|e| ChannelError::InvalidEnvelope(e.to_string()))?;
    envelope.into_events()
}

/// Command sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundCommand {
    #[serde(rename = "breathing_exercise")]
    BeginBreathing,
    CheckIn,
    EndSession,
}

/// Outbound wire envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: OutboundCommand,
}
