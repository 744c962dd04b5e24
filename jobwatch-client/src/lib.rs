//! Jobwatch HTTP Client
//!
//! A small, type-safe HTTP client for the asynchronous report endpoints.
//!
//! The client knows how to submit a job and how to ask about its status.
//! It does not poll and does not retry; scheduling belongs to the poller.
//!
//! # Example
//!
//! ```no_run
//! use jobwatch_client::{JobBackend, ReportClient, SubmitOutcome};
//! use jobwatch_core::domain::request::JobRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ReportClient::new("http://localhost:3000");
//!
//!     let request = JobRequest::new().with_param("status", "pending");
//!     match client.submit(request).await? {
//!         SubmitOutcome::Completed(result) => println!("Report: {}", result),
//!         SubmitOutcome::Accepted(handle) => println!("Accepted as {}", handle),
//!     }
//!     Ok(())
//! }
//! ```

mod backend;
pub mod error;
mod jobs;

pub use backend::{JobBackend, SubmitOutcome};
pub use error::{ClientError, Result};

use reqwest::{Client, Url};

/// Default path of the report submission endpoint
pub const DEFAULT_SUBMIT_PATH: &str = "/api/admin/reports";

/// Default path of the report status endpoint; the job id is appended
pub const DEFAULT_STATUS_PATH: &str = "/api/admin/reports/status";

/// HTTP client for the report backend
#[derive(Debug, Clone)]
pub struct ReportClient {
    /// Base URL of the backend (e.g., "http://localhost:3000")
    base_url: String,
    /// Path of the submission endpoint
    submit_path: String,
    /// Path prefix of the status endpoint
    status_path: String,
    /// HTTP client instance
    client: Client,
}

impl ReportClient {
    /// Create a new client with the default endpoint paths
    ///
    /// # Example
    /// ```
    /// use jobwatch_client::ReportClient;
    ///
    /// let client = ReportClient::new("http://localhost:3000/");
    /// assert_eq!(client.base_url(), "http://localhost:3000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use jobwatch_client::ReportClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ReportClient::with_client("http://localhost:3000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
            client,
        }
    }

    /// Override the submission and status endpoint paths
    pub fn with_paths(mut self, submit_path: &str, status_path: &str) -> Self {
        self.submit_path = normalize_path(submit_path);
        self.status_path = normalize_path(status_path);
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the submission endpoint
    fn submit_url(&self) -> Result<Url> {
        Url::parse(&format!("{}{}", self.base_url, self.submit_path))
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid submit URL: {}", e)))
    }

    /// Full URL of the status endpoint for a job
    ///
    /// The job id is appended as a single, percent-encoded path segment.
    fn status_url(&self, job_id: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, self.status_path))
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid status URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest("Status URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(job_id);

        Ok(url)
    }
}

/// Ensures a path starts with a single '/' and has no trailing '/'
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{}", trimmed)
}
