//! Harness configuration

use anyhow::Result;
use serde::Deserialize;

/// Harness configuration, loaded from LOADLAB_* environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Version stamped on benchmark suites
    #[serde(default = "default_version")]
    pub version: String,

    /// Environment stamped on benchmark suites
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Simulated backend failure rate (fraction)
    #[serde(default = "default_failure_rate")]
    pub backend_failure_rate: f64,

    /// Simulated backend per-actor queue capacity
    #[serde(default = "default_queue_capacity")]
    pub backend_queue_capacity: usize,

    /// Current production user count fed to capacity planning
    #[serde(default = "default_current_users")]
    pub current_users: u64,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "local".to_string()
}

fn default_failure_rate() -> f64 {
    0.01
}

fn default_queue_capacity() -> usize {
    100
}

fn default_current_users() -> u64 {
    100
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            environment: default_environment(),
            backend_failure_rate: default_failure_rate(),
            backend_queue_capacity: default_queue_capacity(),
            current_users: default_current_users(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("LOADLAB"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
