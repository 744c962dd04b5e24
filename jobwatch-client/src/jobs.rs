//! Report job endpoints

use async_trait::async_trait;
use jobwatch_core::domain::job::JobHandle;
use jobwatch_core::domain::request::JobRequest;
use jobwatch_core::domain::status::RemoteStatus;
use jobwatch_core::dto::job::{ErrorBody, StatusResponse, SubmitResponse};
use reqwest::StatusCode;
use tracing::debug;

use crate::ReportClient;
use crate::backend::{JobBackend, SubmitOutcome};
use crate::error::{ClientError, Result};

#[async_trait]
impl JobBackend for ReportClient {
    async fn submit(&self, request: JobRequest) -> Result<SubmitOutcome> {
        let url = self.submit_url()?;
        debug!("Submitting report job to {}", url);

        let mut builder = self.client.get(url);
        if !request.is_empty() {
            builder = builder.query(&request.query_pairs());
        }

        let response = builder.send().await?;

        let status = response.status();
        let body = response.text().await?;

        interpret_submit(status, &body)
    }

    async fn check_status(&self, handle: &JobHandle) -> Result<RemoteStatus> {
        let url = self.status_url(&handle.job_id)?;
        debug!("Checking status of job {}", handle);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        interpret_status(status, &body)
    }
}

/// Interprets a submission response
///
/// - 202 must carry a `jobId` and becomes `Accepted`
/// - any other 2xx becomes `Completed`; the `data` field is the result when
///   present, otherwise the whole body is
/// - anything else is an API error carrying the body's `error` text
fn interpret_submit(status: StatusCode, body: &str) -> Result<SubmitOutcome> {
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    if status == StatusCode::ACCEPTED {
        let parsed: SubmitResponse = parse_json(body)?;
        return match parsed.job_id {
            Some(job_id) if !job_id.is_empty() => {
                Ok(SubmitOutcome::Accepted(JobHandle::new(job_id)))
            }
            _ => Err(ClientError::ParseError(
                "Accepted response carried no jobId".to_string(),
            )),
        };
    }

    if body.trim().is_empty() {
        return Ok(SubmitOutcome::Completed(serde_json::Value::Null));
    }

    let value: serde_json::Value = parse_json(body)?;
    let result = match value {
        serde_json::Value::Object(mut fields) if fields.contains_key("data") => fields
            .remove("data")
            .unwrap_or(serde_json::Value::Null),
        other => other,
    };

    Ok(SubmitOutcome::Completed(result))
}

/// Interprets a status check response
fn interpret_status(status: StatusCode, body: &str) -> Result<RemoteStatus> {
    if !status.is_success() {
        return Err(api_error(status, body));
    }

    let parsed: StatusResponse = parse_json(body)?;
    Ok(RemoteStatus::from(parsed))
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Builds an API error, preferring the body's `error` field over raw text
fn api_error(status: StatusCode, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    ClientError::api_error(status.as_u16(), message)
}
