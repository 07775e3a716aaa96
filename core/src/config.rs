use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "BOOKTRACK";

/// Client settings, layered from an optional `.env` file and `BOOKTRACK_*`
/// environment variables (`BOOKTRACK_BASE_URL`, `BOOKTRACK_TIMEOUT_MS`).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default = "ClientConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ClientConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // A missing `.env` is fine.
        let _ = dotenvy::dotenv();
        Self::from_builder(Config::builder().add_source(Environment::with_prefix(ENV_PREFIX)))
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn default_base_url() -> String {
        "https://backendbooktrack-production.up.railway.app/api".to_string()
    }

    fn default_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}
