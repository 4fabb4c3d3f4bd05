//! pocketbot-llm: the conversation endpoint client.
//!
//! Requests carry `{model, messages, tools, tool_choice: "auto"}` either over
//! direct HTTP or over a publish/subscribe broker with correlation-tagged
//! replies and a bounded wait. Raw responses are normalized into [`normalize::LlmReply`].

pub mod normalize;
pub mod transport;

use serde_json::{Value, json};
use tracing::warn;

use pocketbot_config::{LlmConfig, LlmMode};
use pocketbot_types::ChatMessage;

use crate::transport::{HttpTransport, PubSubTransport};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket transport error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("timed out waiting for a correlated reply")]
    Timeout,
    #[error("broker closed the connection before replying")]
    ConnectionClosed,
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One request/response exchange with the conversation endpoint.
///
/// The raw response document comes back unnormalized; callers feed it to
/// [`normalize::normalize_reply`].
#[async_trait::async_trait]
pub trait LlmBackend: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<Value, LlmError>;
}

/// Client over the configured transport(s).
pub struct LlmClient {
    config: LlmConfig,
    http: HttpTransport,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = HttpTransport::new(&config.http)?;
        Ok(Self { config, http })
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[Value]) -> Value {
        json!({
            "model": self.config.http.model,
            "messages": messages,
            "tools": tools,
            "tool_choice": "auto",
        })
    }
}

#[async_trait::async_trait]
impl LlmBackend for LlmClient {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<Value, LlmError> {
        let body = self.request_body(messages, tools);
        match self.config.mode {
            LlmMode::Http => self.http.request(&body).await,
            LlmMode::Pubsub => {
                let pubsub = PubSubTransport::new(&self.config.pubsub);
                match pubsub.request(&body).await {
                    Ok(response) => Ok(response),
                    Err(e) if self.config.fallback_to_http => {
                        warn!("Pub/sub transport failed ({e}), falling back to HTTP");
                        self.http.request(&body).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}
