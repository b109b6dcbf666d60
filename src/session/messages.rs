use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Therapist,
    System,
}

/// What produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Greeting,
    Turn,
    Reply,
    CheckIn,
    Transition,
    Closing,
    /// Text pushed by the server over the realtime channel
    Remote,
    Notice,
    Error,
}

/// Spoken state of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechState {
    NotRequested,
    Pending,
    Queued,
    Played,
    TextOnly,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub kind: MessageKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub speech: SpeechState,
}

/// Append-only message log for the current session
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id
    pub fn append(&mut self, role: Role, kind: MessageKind, text: impl Into<String>) -> Uuid {
        let message = Message {
            id: Uuid::new_v4(),
            role,
            kind,
            text: text.into(),
            created_at: Utc::now(),
            speech: SpeechState::NotRequested,
        };
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn set_speech(&mut self, id: Uuid, speech: SpeechState) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.speech = speech;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn count_kind(&self, kind: MessageKind) -> usize {
        self.messages.iter().filter(|m| m.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = MessageLog::new();
        log.append(Role::User, MessageKind::Turn, "hello");
        log.append(Role::Therapist, MessageKind::Reply, "welcome");

        let texts: Vec<&str> = log.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "welcome"]);
    }

    #[test]
    fn test_set_speech_unknown_id() {
        let mut log = MessageLog::new();
        assert!(!log.set_speech(Uuid::new_v4(), SpeechState::Played));
    }
}
