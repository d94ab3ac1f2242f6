//! OpenAI Responses API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CompletionClient, LlmError};
use crate::config::Secret;

/// Model every run is sent to.
pub const MODEL: &str = "gpt-4o";
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    /// Present on some compatible servers; the official API leaves it to SDKs.
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesResponse {
    /// All `output_text` parts of all `message` items, concatenated in order.
    fn output_text(&self) -> Option<String> {
        if let Some(text) = &self.output_text {
            return Some(text.clone());
        }

        let parts: Vec<&str> = self
            .output
            .iter()
            .filter(|item| item.kind == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.kind == "output_text")
            .filter_map(|part| part.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }
}

impl OpenAiClient {
    /// Create a client for the API rooted at `base_url`
    /// (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: &str, api_key: Secret) -> Result<Self, LlmError> {
        reqwest::Url::parse(base_url).map_err(|_| LlmError::InvalidUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("pr-describer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn model(&self) -> &str {
        MODEL
    }

    #[instrument(skip(self, prompt), fields(model = MODEL, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let endpoint = format!("{}/responses", self.base_url);
        let payload = ResponsesRequest {
            model: MODEL,
            input: prompt,
        };

        debug!("sending completion request");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(unreadable response body)".to_string());
            return Err(LlmError::ApiStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let decoded: ResponsesResponse = response.json().await?;
        let text = decoded.output_text().ok_or(LlmError::EmptyCompletion)?;
        let text = text.trim();
        debug!(completion_len = text.len(), "received completion");
        Ok(text.to_string())
    }
}
