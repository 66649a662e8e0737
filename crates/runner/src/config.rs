//! Runner configuration from environment variables.

use std::time::Duration;

use gridpy_session::SessionConfig;

/// Environment variable naming the Python interpreter to spawn.
const ENV_PYTHON_BIN: &str = "GRIDPY_PYTHON_BIN";

/// Environment variable for the worker bootstrap timeout, in seconds.
const ENV_BOOTSTRAP_TIMEOUT_SECS: &str = "GRIDPY_BOOTSTRAP_TIMEOUT_SECS";

/// Environment variable for the console event bus capacity.
const ENV_EVENT_CAPACITY: &str = "GRIDPY_EVENT_CAPACITY";

/// Typed runner configuration with environment-variable overrides.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Worker session settings.
    pub session: SessionConfig,
    /// Buffer capacity of the console event bus.
    pub event_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            event_capacity: 256,
        }
    }
}

impl RunnerConfig {
    /// Build a config from the environment, falling back to defaults for
    /// unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(bin) = std::env::var(ENV_PYTHON_BIN) {
            if !bin.is_empty() {
                config.session.python_bin = bin;
            }
        }
        if let Some(secs) = env_parse::<u64>(ENV_BOOTSTRAP_TIMEOUT_SECS) {
            config.session.bootstrap_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = env_parse::<usize>(ENV_EVENT_CAPACITY) {
            if capacity > 0 {
                config.event_capacity = capacity;
            }
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("ignoring unparsable {name}={raw}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
