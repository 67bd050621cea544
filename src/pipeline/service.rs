//! The generative-service seam.
//!
//! The enrichment stage only ever talks to [`GenerativeService`]: a single
//! async call taking a [`ChatRequest`] and returning the reply text or a
//! [`ServiceError`]. [`LlmProviderService`] is the production implementation
//! over an `edgequake-llm` provider; tests plug in scripted services.
//!
//! Failures are ordinary values here. Nothing in this module retries.

use crate::error::ServiceError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Who is speaking in a [`ChatTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

/// An image sent inline with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// e.g. `"image/png"`.
    pub mime_type: String,
    /// Standard base64 of the image bytes.
    pub data_b64: String,
}

impl ImageAttachment {
    /// Self-describing data reference: `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_b64)
    }
}

/// Content of a chat turn: plain text, or text plus one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatContent {
    Text(String),
    TextWithImage { text: String, image: ImageAttachment },
}

impl ChatContent {
    /// The text part, whatever the variant.
    pub fn text(&self) -> &str {
        match self {
            ChatContent::Text(t) => t,
            ChatContent::TextWithImage { text, .. } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: ChatContent,
}

impl ChatTurn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: ChatContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatContent::Text(text.into()),
        }
    }

    pub fn user_with_image(text: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            role: ChatRole::User,
            content: ChatContent::TextWithImage {
                text: text.into(),
                image,
            },
        }
    }
}

/// One request to the generative service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// Deployment / model identifier.
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub max_tokens: usize,
}

impl ChatRequest {
    /// Text of the first system turn, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.text())
    }

    /// Whether any turn carries an image.
    pub fn has_image(&self) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m.content, ChatContent::TextWithImage { .. }))
    }
}

/// Reply of one service call.
pub type ServiceReply = Result<String, ServiceError>;

/// A text/vision completion backend.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Send `request` and return the first choice's message content.
    ///
    /// An empty string is a valid reply; callers decide what it means.
    async fn complete(&self, request: &ChatRequest) -> ServiceReply;
}

/// [`GenerativeService`] over an `edgequake-llm` provider.
///
/// The provider is bound to its model when it is created, so
/// [`ChatRequest::model`] is only logged here.
pub struct LlmProviderService {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
    timeout: Duration,
}

impl LlmProviderService {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: Option<f32>, timeout_secs: u64) -> Self {
        Self {
            provider,
            temperature,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

#[async_trait]
impl GenerativeService for LlmProviderService {
    async fn complete(&self, request: &ChatRequest) -> ServiceReply {
        let messages = to_chat_messages(&request.messages);
        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| ServiceError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ServiceError::Api {
                detail: e.to_string(),
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            request.model,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(response.content)
    }
}

fn to_chat_messages(turns: &[ChatTurn]) -> Vec<ChatMessage> {
    turns
        .iter()
        .map(|turn| match (&turn.role, &turn.content) {
            (ChatRole::System, content) => ChatMessage::system(content.text()),
            (ChatRole::User, ChatContent::Text(text)) => ChatMessage::user(text.as_str()),
            (ChatRole::User, ChatContent::TextWithImage { text, image }) => {
                ChatMessage::user_with_images(
                    text.as_str(),
                    vec![ImageData::new(image.data_b64.clone(), image.mime_type.clone())],
                )
            }
        })
        .collect()
}
