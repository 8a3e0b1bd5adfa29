//! HTTP scoring backend.
//!
//! Wire contract: `POST {base_url}/calculate-perplexity` with `{"text": ...}`,
//! answered by `{"perplexity": <number>}`. A `score` field is accepted as an
//! alias. Anything else (non-2xx, unparsable body, missing or non-finite
//! number) is a [`ScoreError`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ScoreBackend;
use crate::error::{ScoreError, ScoreResult};

/// Path appended to the base URL for scoring requests.
pub const SCORE_PATH: &str = "/calculate-perplexity";

/// Longest slice of an error body kept in [`ScoreError::Status`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct ScoreRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ScoreResponse {
    perplexity: Option<f64>,
    score: Option<f64>,
}

/// Remote scoring service client.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RemoteBackend {
    /// Create a client for the service at `base_url` with a per-call timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ScoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScoreError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full scoring endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}{SCORE_PATH}", self.base_url)
    }

    /// Per-call timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check that the service answers HTTP at all.
    ///
    /// Any response, whatever its status, counts as reachable.
    #[tracing::instrument(skip(self), fields(url = %self.base_url))]
    pub async fn ping(&self) -> ScoreResult<()> {
        self.client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| self.map_transport(&e))?;
        Ok(())
    }

    fn map_transport(&self, err: &reqwest::Error) -> ScoreError {
        if err.is_timeout() {
            ScoreError::Timeout(self.timeout)
        } else {
            ScoreError::Transport(err.to_string())
        }
    }
}

/// Parse a 2xx response body into a score.
fn parse_score(body: &str) -> ScoreResult<f64> {
    let parsed: ScoreResponse =
        serde_json::from_str(body).map_err(|e| ScoreError::Malformed(e.to_string()))?;
    let value = parsed
        .perplexity
        .or(parsed.score)
        .ok_or_else(|| ScoreError::Malformed("missing `perplexity` field".to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ScoreError::Malformed(format!(
            "score must be a finite non-negative number, got {value}"
        )));
    }
    Ok(value)
}

#[async_trait]
impl ScoreBackend for RemoteBackend {
    async fn score(&self, text: &str) -> ScoreResult<f64> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&ScoreRequest { text })
            .send()
            .await
            .map_err(|e| self.map_transport(&e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(&e))?;

        if !status.is_success() {
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(ScoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_score(&body)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}
