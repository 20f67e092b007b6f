//! Client for the external analysis engine. Only result documents are read;
//! the engine owns processing.

use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub(crate) enum BackendError {
    #[error("results for task {0} are not available yet")]
    NotFound(String),
    #[error("analysis backend unreachable: {0}")]
    Unreachable(String),
    #[error("analysis backend returned status {0}")]
    Status(u16),
    #[error("analysis backend returned malformed results: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Clone)]
pub(crate) struct AnalysisBackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisBackendClient {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn results_url(&self, task_id: &str) -> String {
        format!("{}/uploads/{task_id}_results.json", self.base_url)
    }

    pub(crate) async fn fetch_results(&self, task_id: &str) -> Result<Value, BackendError> {
        let url = self.results_url(task_id);
        tracing::debug!(task_id, url = %url, "Fetching analysis results");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| BackendError::Unreachable(error.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(task_id.to_string()));
        }
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|error| BackendError::InvalidBody(error.to_string()))
    }
}
