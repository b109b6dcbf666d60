use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and default settings for the session flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base address of the session service (e.g., "http://localhost:8001")
    pub base_url: String,

    /// Duration preselected in the timer setup screen
    /// Default: 15 minutes
    pub default_minutes: u32,

    /// Pause between the closing message and the reset to persona selection
    pub settle_delay: Duration,

    /// Delay before a recommended meditation menu opens, so the reply can finish
    pub suggestion_delay: Duration,

    /// Interval between check-ins during an unattended meditation
    pub check_in_interval: Duration,

    /// Period of the background tick driving the countdown and check-ins
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            default_minutes: 15,
            settle_delay: Duration::from_secs(3),
            suggestion_delay: Duration::from_secs(4),
            check_in_interval: Duration::from_secs(300), // 5 minutes
            tick_interval: Duration::from_secs(1),
        }
    }
}
