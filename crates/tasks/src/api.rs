//! REST API client for the scribe server task endpoints.
//!
//! Wraps job submission (`POST <job-endpoint>`) and status retrieval
//! (`GET /api/tasks/{task_id}`) using [`reqwest`].

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use scribe_core::status::StatusResponse;
use scribe_core::types::TaskId;
use serde::Deserialize;

use crate::payload::Payload;
use crate::server::TaskServer;

/// JSON fields checked, in order, for a server-provided error message.
const ERROR_MESSAGE_FIELDS: [&str; 3] = ["error", "detail", "message"];

/// HTTP client for a single scribe server.
#[derive(Debug, Clone)]
pub struct TaskApi {
    client: reqwest::Client,
    base_url: String,
    /// Per-request timeout for submissions, overriding the client's.
    submit_timeout: Option<Duration>,
}

/// Response returned by a job endpoint after the server accepted a job.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier of the queued task.
    pub task_id: TaskId,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum TaskApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Server error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body was not the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// A URL could not be built from the base URL and endpoint.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A multipart input file could not be read.
    #[error("Failed to read input file {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskApiError {
    /// The message to show a user for this failure.
    ///
    /// For server rejections this is the body's conventional error field,
    /// else the raw body, else `HTTP <code>`.
    pub fn user_message(&self) -> String {
        match self {
            TaskApiError::ApiError { status, body } => extract_error_message(*status, body),
            other => other.to_string(),
        }
    }

    /// HTTP status of a server rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TaskApiError::ApiError { status, .. } => Some(*status),
            TaskApiError::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl TaskApi {
    /// Create a new API client for a scribe server.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: &str) -> Result<Self, TaskApiError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (timeouts, proxies and connection pooling are configured there).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, TaskApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| TaskApiError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            submit_timeout: None,
        })
    }

    /// Give submissions their own timeout.
    ///
    /// Uploads can take far longer than a status poll, so the client-wide
    /// timeout is usually too short for them.
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a job to `endpoint` (a path such as `/api/transcribe`).
    ///
    /// Returns the server-assigned task id.
    pub async fn submit(
        &self,
        endpoint: &str,
        payload: Payload,
    ) -> Result<SubmitResponse, TaskApiError> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.client.post(url);
        if let Some(timeout) = self.submit_timeout {
            request = request.timeout(timeout);
        }
        let request = payload.apply(request).await?;
        let response = Self::ensure_success(request.send().await?).await?;

        let body = response.text().await?;
        serde_json::from_str::<SubmitResponse>(&body).map_err(|e| {
            TaskApiError::Decode(format!("expected {{\"task_id\": string}}, got {body:?} ({e})"))
        })
    }

    /// Retrieve the current status of a task.
    ///
    /// Sends a `GET /api/tasks/{task_id}` request; the id is
    /// percent-encoded as a single path segment.
    pub async fn get_status(&self, task_id: &TaskId) -> Result<StatusResponse, TaskApiError> {
        let mut url = self.endpoint_url("/api/tasks")?;
        url.path_segments_mut()
            .map_err(|_| TaskApiError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .push(task_id.as_str());

        let response = self.client.get(url).send().await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, TaskApiError> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| TaskApiError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`TaskApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TaskApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaskApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TaskApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl TaskServer for TaskApi {
    async fn submit_job(&self, endpoint: &str, payload: Payload) -> Result<TaskId, TaskApiError> {
        Ok(self.submit(endpoint, payload).await?.task_id)
    }

    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusResponse, TaskApiError> {
        self.get_status(task_id).await
    }
}

/// Pick the message to report for a rejected request.
///
/// Preference: a string (or structured) value in one of the
/// conventional error fields of a JSON body, then the raw body text,
/// then a generic `HTTP <code>`.
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        for key in ERROR_MESSAGE_FIELDS {
            match fields.get(key) {
                Some(serde_json::Value::String(message)) if !message.trim().is_empty() => {
                    return message.clone();
                }
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}
