//! Abstractive summaries via an OpenAI-compatible chat-completions API.
//!
//! The client is built once at startup and shared behind an `Arc`. Each call sends the same
//! two-message conversation: a fixed system instruction followed by the extracted document text
//! as the user turn. The first completion's content is returned verbatim.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// System instruction sent ahead of every document.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Summarize the following text.";

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider could not be reached or the client could not be constructed.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response (auth, quota, server error).
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or carried no completion.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Summary text returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    /// Generated summary, exactly as the provider returned it.
    pub text: String,
    /// Model that produced the summary.
    pub model: String,
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Summarize the supplied text.
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizationClientError>;
}

/// Build the shared summarization client from configuration.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    let client = OpenAiSummarizationClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.summarization_model.clone(),
    )?;
    Ok(Arc::new(client))
}

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiSummarizationClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizationClient {
    /// Create a client for the given API root, credential, and model.
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent(concat!("pdf-summarizer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

#[async_trait]
impl SummarizationClient for OpenAiSummarizationClient {
    async fn summarize(&self, text: &str) -> Result<SummaryResult, SummarizationClientError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode chat completion: {error}"
            ))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummarizationClientError::InvalidResponse("no choices returned".into()))?
            .message
            .content
            .ok_or_else(|| {
                SummarizationClientError::InvalidResponse("first choice has no content".into())
            })?;

        tracing::debug!(model = %self.model, chars = content.len(), "Received completion");
        Ok(SummaryResult {
            text: content,
            model: self.model.clone(),
        })
    }
}
