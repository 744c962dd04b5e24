//! Configuration module
//!
//! Builds the poller configuration from the environment, then applies the
//! values given on the command line.

use anyhow::Result;
use jobwatch_poller::Config;
use std::time::Duration;
use tracing::debug;

/// Values given on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub max_wait_secs: Option<u64>,
}

/// Loads configuration from the environment with fallback to defaults
pub fn load_config(overrides: Overrides) -> Result<Config> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            debug!("Using default configuration: {}", e);
            Config::default()
        }
    };

    let config = apply_overrides(config, overrides);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(mut config: Config, overrides: Overrides) -> Config {
    if let Some(url) = overrides.url {
        config.base_url = url;
    }

    if let Some(secs) = overrides.request_timeout_secs {
        config.request_timeout = Some(Duration::from_secs(secs));
    }

    if let Some(ms) = overrides.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }

    if let Some(max_attempts) = overrides.max_attempts {
        config = config.with_max_attempts(max_attempts);
    }

    if let Some(secs) = overrides.max_wait_secs {
        config = config.with_max_wait(Duration::from_secs(secs));
    }

    config
}
