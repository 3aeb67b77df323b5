use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// File the configuration is read from, relative to the working directory.
pub const CONFIG_FILE: &str = "EVote.toml";

/// Prefix of environment variables that override the file.
pub const ENV_PREFIX: &str = "EVOTE_";

/// Client configuration, derived from defaults, `EVote.toml`, and `EVOTE_*`
/// environment variables, in increasing order of precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    base_url: String,
    timeout_ms: u64,
    log_config: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/".to_string(),
            timeout_ms: 10_000,
            log_config: "log4rs.yaml".to_string(),
        }
    }
}

impl Config {
    /// The layered configuration sources.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration from all sources.
    pub fn load() -> figment::Result<Self> {
        Self::figment().extract()
    }

    /// Root URL of the election service; request paths are appended to it.
    /// Configured via `EVOTE_BASE_URL`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Time allowed for a single request.
    /// Configured via `EVOTE_TIMEOUT_MS`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Path of the log4rs configuration file.
    /// Configured via `EVOTE_LOG_CONFIG`.
    pub fn log_config(&self) -> &str {
        &self.log_config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
