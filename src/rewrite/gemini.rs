use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::error::RewriteError;
use crate::rewrite::{NotesRewriter, RewriteConfig, RewriteRequest};

/// Rewriter backed by the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiRewriter {
    client: reqwest::Client,
    config: RewriteConfig,
}

impl GeminiRewriter {
    pub fn new(config: RewriteConfig) -> Result<Self, RewriteError> {
        if config.api_key.trim().is_empty() {
            return Err(RewriteError::MissingCredential);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RewriteError::Http(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(body: &Value) -> Result<String, RewriteError> {
        let parts = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| RewriteError::Parse(format!("unexpected response format: {}", body)))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        let text = text.trim();
        if text.is_empty() {
            return Err(RewriteError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl NotesRewriter for GeminiRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        let body = json!({
            "contents": [
                { "parts": [ { "text": request.prompt() } ] }
            ]
        });
        let url = self.config.generate_url();
        debug!("sending rewrite request to {} ({})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RewriteError::Timeout(self.config.timeout_seconds)
                } else {
                    RewriteError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("rewrite service is rate limiting requests");
            return Err(RewriteError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RewriteError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| RewriteError::Parse(format!("invalid JSON body: {}", e)))?;
        Self::extract_text(&value)
    }
}
