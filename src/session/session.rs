use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shortest configurable session, in minutes
pub const MIN_MINUTES: u32 = 5;

/// Longest configurable session, in minutes
pub const MAX_MINUTES: u32 = 60;

/// Clamp a requested duration into `[MIN_MINUTES, MAX_MINUTES]`
pub fn clamp_minutes(minutes: i64) -> u32 {
    minutes.clamp(MIN_MINUTES as i64, MAX_MINUTES as i64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Inactive,
    Active,
    Ended,
}

/// The session record created by `start_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Server-issued session identifier
    pub id: String,

    pub persona_id: String,

    pub duration_minutes: u32,

    pub started_at: DateTime<Utc>,

    pub remaining_seconds: u32,

    pub status: SessionStatus,
}

impl Session {
    pub fn new(id: String, persona_id: String, duration_minutes: u32) -> Self {
        Self {
            id,
            persona_id,
            duration_minutes,
            started_at: Utc::now(),
            remaining_seconds: duration_minutes * 60,
            status: SessionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_minutes() {
        assert_eq!(clamp_minutes(0), MIN_MINUTES);
        assert_eq!(clamp_minutes(-20), MIN_MINUTES);
        assert_eq!(clamp_minutes(30), 30);
        assert_eq!(clamp_minutes(61), MAX_MINUTES);
    }

    #[test]
    fn test_new_session_counts_down_from_full_duration() {
        let session = Session::new("abc".to_string(), "calm_female".to_string(), 15);
        assert_eq!(session.remaining_seconds, 900);
        assert!(session.is_active());
    }
}
