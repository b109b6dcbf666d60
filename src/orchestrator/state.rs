use serde::{Deserialize, Serialize};
use std::fmt;

/// Screens of the session flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    VoiceSelection,
    TimerSetup,
    ActiveSession,
    MeditationSelection,
    MeditationActive,
}

impl Screen {
    /// Screens that belong to a running session
    pub fn in_session(self) -> bool {
        matches!(
            self,
            Screen::ActiveSession | Screen::MeditationSelection | Screen::MeditationActive
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::VoiceSelection => "voice selection",
            Screen::TimerSetup => "timer setup",
            Screen::ActiveSession => "active session",
            Screen::MeditationSelection => "meditation selection",
            Screen::MeditationActive => "active meditation",
        };
        f.write_str(name)
    }
}
