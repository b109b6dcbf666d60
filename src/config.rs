use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::policy::DEFAULT_SUGGESTION_PROBABILITY;
use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionTimings,
    #[serde(default)]
    pub policy: PolicyConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Session service location
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionTimings {
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_suggestion_delay")]
    pub suggestion_delay_secs: u64,
    #[serde(default = "default_check_in_interval")]
    pub check_in_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_probability")]
    pub suggestion_probability: f64,
    /// Replaces the built-in stress keywords when set
    pub keywords: Option<Vec<String>>,
    /// Fixed dice seed for reproducible runs
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    /// Directory receiving one WAV file per played clip
    pub output_dir: PathBuf,
    /// Hold each clip for its duration, like a speaker would
    #[serde(default = "default_realtime")]
    pub realtime: bool,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_minutes() -> u32 {
    15
}

fn default_settle_delay() -> u64 {
    3
}

fn default_suggestion_delay() -> u64 {
    4
}

fn default_check_in_interval() -> u64 {
    300
}

fn default_probability() -> f64 {
    DEFAULT_SUGGESTION_PROBABILITY
}

fn default_realtime() -> bool {
    true
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            settle_delay_secs: default_settle_delay(),
            suggestion_delay_secs: default_suggestion_delay(),
            check_in_interval_secs: default_check_in_interval(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            suggestion_probability: default_probability(),
            keywords: None,
            seed: None,
        }
    }
}

impl Config {
    /// Load from a config file (extension optional) with `SERENE__*` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("SERENE").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Invalid config {}", path))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Settings handed to the orchestrator
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            base_url: self.backend.base_url.clone(),
            default_minutes: self.session.default_minutes,
            settle_delay: Duration::from_secs(self.session.settle_delay_secs),
            suggestion_delay: Duration::from_secs(self.session.suggestion_delay_secs),
            check_in_interval: Duration::from_secs(self.session.check_in_interval_secs),
            ..SessionConfig::default()
        }
    }
}
