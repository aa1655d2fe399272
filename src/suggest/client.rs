//! HTTP client for the suggestion service.
//!
//! `POST {base}/api/analyze-content` with `{"text": "..."}`. A 200 answer
//! carries `{"suggestions": {...}}`; 400 and 500 answers carry
//! `{"error": "..."}`. Anything other than a decodable 2xx is reported as
//! [`SuggestError::Unavailable`].

use super::{SuggestError, SuggestionSource, Suggestions};
use crate::config::ExtractionConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const ANALYZE_PATH: &str = "/api/analyze-content";

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    suggestions: Suggestions,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Calls a running suggestion service.
///
/// The underlying `reqwest::Client` is built once, so repeated calls share
/// its connection pool.
#[derive(Debug, Clone)]
pub struct HttpSuggestionClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpSuggestionClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, SuggestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestError::Unavailable(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", api_base.trim_end_matches('/'), ANALYZE_PATH),
            timeout,
        })
    }

    /// Endpoint and timeout taken from `config`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, SuggestError> {
        Self::new(
            &config.suggestion_api_base,
            Duration::from_secs(config.suggestion_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SuggestionSource for HttpSuggestionClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn suggest(&self, text: &str) -> Result<Suggestions, SuggestError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SuggestError::EmptyText);
        }

        info!("Requesting suggestions from {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SuggestError::Unavailable(format!("timed out after {:?}", self.timeout))
                } else {
                    SuggestError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = match response.json::<ErrorResponse>().await {
                Ok(body) => format!("HTTP {}: {}", status, body.error),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(SuggestError::Unavailable(reason));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| SuggestError::Unavailable(format!("invalid response body: {}", e)))?;
        debug!(
            "Received {} hashtags, {} tips",
            body.suggestions.hashtags.len(),
            body.suggestions.tips.len()
        );
        Ok(body.suggestions)
    }
}
