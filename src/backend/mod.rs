//! HTTP client for the sentence generation backend
//!
//! The backend is a black box: `POST /generate` turns a start word into a
//! sentence, `GET /` reports whether the model is loaded.

#[cfg(test)]
pub mod mock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const GENERATE_PATH: &str = "/generate";
const HEALTH_PATH: &str = "/";

/// Errors from talking to the backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-2xx status
    #[error("backend returned HTTP {status}")]
    Network { status: u16 },

    /// The request never completed, or the reply was not what we expected
    #[error("transport error: {0}")]
    Transport(String),
}

impl BackendError {
    fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => BackendError::Network { status },
            other => BackendError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub start_word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub sentence: String,
}

/// Body of the backend's root route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    agent: ureq::Agent,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a route onto the base address, tolerating a trailing slash
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Ask the backend for a sentence starting from `start_word`.
    ///
    /// The word is forwarded verbatim. Exactly one request is made: no
    /// retries, no timeout.
    pub async fn generate(&self, start_word: &str) -> Result<String, BackendError> {
        let url = self.endpoint(GENERATE_PATH);
        let agent = self.agent.clone();
        let body = GenerateRequest {
            start_word: start_word.to_string(),
        };

        tracing::debug!(url = %url, start_word = %body.start_word, "Requesting sentence");

        tokio::task::spawn_blocking(move || {
            let response = agent
                .post(&url)
                .header("content-type", "application/json")
                .send_json(&body)
                .map_err(BackendError::from_ureq)?;

            let reply: GenerateResponse = response.into_body().read_json().map_err(|e| {
                BackendError::Transport(format!("failed to parse response as JSON: {}", e))
            })?;

            Ok(reply.sentence)
        })
        .await
        .map_err(|e| BackendError::Transport(format!("task join error: {}", e)))?
    }

    /// Probe the backend's root route
    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        let url = self.endpoint(HEALTH_PATH);
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || {
            let response = agent.get(&url).call().map_err(BackendError::from_ureq)?;

            response.into_body().read_json().map_err(|e| {
                BackendError::Transport(format!("failed to parse health response: {}", e))
            })
        })
        .await
        .map_err(|e| BackendError::Transport(format!("task join error: {}", e)))?
    }
}
