//! OpenAI-compatible chat-completions client using reqwest

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::config::Settings;
use crate::{Error, Result};

use super::{ChatClient, ChatRequest};

/// Successful response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for `/chat/completions` on an OpenAI-compatible API
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl OpenAiClient {
    /// Create a client from resolved settings
    ///
    /// A missing API key is not an error here; `complete` reports it
    /// without touching the network.
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("critique/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(endpoint = %settings.endpoint, "Created chat-completions client");

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::Auth(format!(
                "No API key found. Set {} or add api_key to ~/.config/critique/secrets.toml",
                crate::secrets::API_KEY_ENV
            ))
        })?;

        debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            "Sending chat-completions request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        extract_content(&body)
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Map a non-success status and body to an error
fn classify_failure(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(500).collect()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(format!("{} ({})", detail, status))
        }
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(detail),
        _ => Error::Upstream(format!("request failed with status {}: {}", status, detail)),
    }
}

/// Pull the completion text out of a success body
fn extract_content(body: &str) -> Result<String> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Upstream(format!("malformed response: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::Upstream("response contained no completion text".to_string()))
}
