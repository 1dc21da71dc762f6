//! Model completion: send the document text and prompt, get the reply back.
//!
//! This module is the only place that talks to the model. It is deliberately
//! thin: prompt text lives in [`crate::prompts`], reply cleanup in
//! [`crate::pipeline::postprocess`].
//!
//! ## Message Layout
//!
//! One request contains, in order:
//! 1. **System message**: the assistant instruction
//! 2. **User message**: the full extracted document text
//! 3. **User message**: the user's extraction prompt
//!
//! ## Failure Policy
//!
//! Exactly one call is made per request. A failed call is classified into a
//! [`CompletionError`] and returned; there is no retry. The call is bounded
//! by `api_timeout_secs`.

use crate::config::ReportConfig;
use crate::error::CompletionError;
use crate::prompts::DEFAULT_SYSTEM_INSTRUCTION;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Everything needed for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub document_text: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionRequest {
    /// Assemble a request from the config, falling back to the default
    /// system instruction.
    pub fn new(
        document_text: impl Into<String>,
        user_prompt: impl Into<String>,
        config: &ReportConfig,
    ) -> Self {
        Self {
            system_instruction: config
                .system_instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            document_text: document_text.into(),
            user_prompt: user_prompt.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// The three chat messages sent to the model.
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(&self.system_instruction),
            ChatMessage::user(&self.document_text),
            ChatMessage::user(&self.user_prompt),
        ]
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

/// A model reply with its usage figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// Anything that can answer a [`CompletionRequest`].
///
/// The pipeline is generic over this trait so tests can substitute a
/// scripted client and count calls.
pub trait CompletionClient: Send + Sync {
    /// Model identifier reported to progress callbacks and logs.
    fn model_name(&self) -> &str;

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<Completion, CompletionError>> + Send;
}

/// [`CompletionClient`] backed by an `edgequake-llm` provider.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    timeout: Duration,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            provider,
            model: model.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl CompletionClient for ProviderClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, CompletionError> {
        let start = Instant::now();
        let messages = request.messages();
        let options = request.options();

        debug!(
            "Sending {} document chars + {} prompt chars to {}",
            request.document_text.chars().count(),
            request.user_prompt.chars().count(),
            self.model
        );

        let response = match tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&options)),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let err = classify_error(&e.to_string());
                warn!("Model call failed: {}", err);
                return Err(err);
            }
            Err(_) => {
                warn!("Model call timed out after {:?}", self.timeout);
                return Err(CompletionError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let duration = start.elapsed();
        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens, response.completion_tokens, duration
        );

        if response.content.trim().is_empty() {
            return Err(CompletionError::EmptyReply);
        }

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            duration_ms: duration.as_millis() as u64,
        })
    }
}

/// Map a provider error message onto the completion error taxonomy.
///
/// Provider errors arrive as text from several backends, so the
/// classification matches on status codes and common phrases.
pub fn classify_error(message: &str) -> CompletionError {
    let lower = message.to_lowercase();
    let msg = message.to_string();

    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("invalid api key")
        || lower.contains("invalid_api_key")
        || lower.contains("authentication")
    {
        CompletionError::Authentication(msg)
    } else if lower.contains("429")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("quota")
        || lower.contains("too many requests")
    {
        CompletionError::RateLimited(msg)
    } else if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
        || lower.contains("connection")
    {
        CompletionError::Network(msg)
    } else if lower.contains("parse")
        || lower.contains("deserializ")
        || lower.contains("invalid json")
        || lower.contains("unexpected response")
    {
        CompletionError::MalformedResponse(msg)
    } else {
        CompletionError::Provider(msg)
    }
}
