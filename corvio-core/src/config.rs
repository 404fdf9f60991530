use crate::error::{CorvioError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport settings for the shared backend HTTP client.
///
/// The deadlines are generous on purpose: a single object PUT may stream
/// for a very long time, so the per-request timeout only exists to reap
/// connections that are truly dead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default = "default_request_timeout_mins")]
    pub request_timeout_mins: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_keepalive_secs() -> u64 {
    5
}

fn default_request_timeout_mins() -> u64 {
    120
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            keepalive_secs: default_keepalive_secs(),
            request_timeout_mins: default_request_timeout_mins(),
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("CORVIO"))
            .build()
            .map_err(|e| CorvioError::Config(e.to_string()))?;

        let config: ClientConfig = settings
            .try_deserialize()
            .map_err(|e| CorvioError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_mins * 60)
    }
}
