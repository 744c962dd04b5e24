//! Poller configuration
//!
//! Defines all configurable parameters for the poller including the
//! backend location, the poll cadence and the optional polling bounds.

use jobwatch_client::{DEFAULT_STATUS_PATH, DEFAULT_SUBMIT_PATH, ReportClient};
use std::time::Duration;

/// Default wait between two status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Status label shown for an accepted job before its first status check
pub const DEFAULT_INITIAL_STATUS: &str = "queued";

/// Poller configuration
///
/// Polling is unbounded unless `max_attempts` or `max_wait` is set. When a
/// bound is exceeded the job ends as failed with a timeout message.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Path of the submission endpoint
    pub submit_path: String,

    /// Path prefix of the status endpoint
    pub status_path: String,

    /// Timeout applied to every HTTP request
    pub request_timeout: Option<Duration>,

    /// How often to check the status of a pending job
    pub poll_interval: Duration,

    /// Label used for `last_known_status` right after acceptance
    pub initial_status: String,

    /// Maximum number of status checks per job
    pub max_attempts: Option<u32>,

    /// Maximum time spent polling a job
    pub max_wait: Option<Duration>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            request_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            initial_status: DEFAULT_INITIAL_STATUS.to_string(),
            max_attempts: None,
            max_wait: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JOBWATCH_URL (required)
    /// - JOBWATCH_SUBMIT_PATH (optional, default: /api/admin/reports)
    /// - JOBWATCH_STATUS_PATH (optional, default: /api/admin/reports/status)
    /// - JOBWATCH_REQUEST_TIMEOUT_SECS (optional, seconds)
    /// - JOBWATCH_POLL_INTERVAL_MS (optional, milliseconds, default: 2000)
    /// - JOBWATCH_MAX_ATTEMPTS (optional)
    /// - JOBWATCH_MAX_WAIT_SECS (optional, seconds)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    ///
    /// Unparsable optional values fall back to their defaults.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let base_url = get("JOBWATCH_URL")
            .ok_or_else(|| anyhow::anyhow!("JOBWATCH_URL environment variable not set"))?;

        let mut config = Self::new(base_url);

        if let Some(path) = get("JOBWATCH_SUBMIT_PATH") {
            config.submit_path = path;
        }

        if let Some(path) = get("JOBWATCH_STATUS_PATH") {
            config.status_path = path;
        }

        config.request_timeout = get("JOBWATCH_REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        config.poll_interval = get("JOBWATCH_POLL_INTERVAL_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        config.max_attempts = get("JOBWATCH_MAX_ATTEMPTS").and_then(|s| s.parse::<u32>().ok());

        config.max_wait = get("JOBWATCH_MAX_WAIT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        Ok(config)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_attempts == Some(0) {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.max_wait.is_some_and(|d| d.is_zero()) {
            anyhow::bail!("max_wait must be greater than 0");
        }

        if self.request_timeout.is_some_and(|d| d.is_zero()) {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }

    /// Builds the HTTP client described by this configuration
    pub fn build_client(&self) -> anyhow::Result<ReportClient> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(ReportClient::with_client(self.base_url.clone(), http_client)
            .with_paths(&self.submit_path, &self.status_path))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:3000".to_string())
    }
}
