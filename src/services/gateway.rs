//! Chat-completion gateway for drawing analysis.
//!
//! The [`AnalysisGateway`] trait is the seam between request handling and the
//! model provider. Production uses [`OpenAiGateway`]; tests inject a fake.
//! Exactly one call is made per analysis, with no retry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::LlmSettings;
use crate::services::prompt::AnalysisPrompt;

/// Failures of the upstream call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredential,

    #[error("provider rejected the API key")]
    InvalidCredential,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid provider response: {0}")]
    Protocol(String),

    #[error("provider returned no content")]
    EmptyResponse,
}

impl GatewayError {
    /// Credential problems are configuration issues rather than outages.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::InvalidCredential)
    }
}

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Sends the prompt and returns the raw text of the model's answer.
    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, GatewayError>;

    /// Whether a credential is available, without calling the provider.
    fn is_configured(&self) -> bool;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Error envelope returned by OpenAI-compatible providers.
#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

fn chat_request<'a>(settings: &'a LlmSettings, prompt: &'a AnalysisPrompt) -> ChatRequest<'a> {
    let content = match &prompt.image {
        None => MessageContent::Text(&prompt.text),
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text { text: &prompt.text },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: &image.data_url,
                    detail: image.detail,
                },
            },
        ]),
    };

    ChatRequest {
        model: &settings.model,
        messages: vec![ChatMessage {
            role: "user",
            content,
        }],
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        response_format: ResponseFormat {
            r#type: "json_object",
        },
    }
}

// =============================================================================
// OpenAI-compatible client
// =============================================================================

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: Client,
    settings: LlmSettings,
}

impl OpenAiGateway {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(
            base_url = %settings.base_url,
            model = %settings.model,
            credential = settings.api_key.is_some(),
            "LLM gateway initialized"
        );

        Ok(Self {
            client,
            settings: LlmSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings.clone()
            },
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url)
    }
}

#[async_trait]
impl AnalysisGateway for OpenAiGateway {
    #[instrument(skip(self, prompt), fields(with_image = prompt.image.is_some()))]
    async fn complete(&self, prompt: &AnalysisPrompt) -> Result<String, GatewayError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(GatewayError::MissingCredential)?;

        let url = self.completions_url();
        debug!(url = %url, prompt_chars = prompt.text.len(), "LLM request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&chat_request(&self.settings, prompt))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "LLM request failed");
                GatewayError::Unavailable(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ProviderErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("LLM provider error: {}", status));

            return match status {
                StatusCode::UNAUTHORIZED => {
                    error!("LLM provider authentication failed");
                    Err(GatewayError::InvalidCredential)
                }
                _ => {
                    error!(status = %status, message = %message, "LLM provider error");
                    Err(GatewayError::Status {
                        status: status.as_u16(),
                        message,
                    })
                }
            };
        }

        let body = response.json::<ChatResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to decode LLM response");
            GatewayError::Protocol(e.to_string())
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }
}
