//! HTTP and publish/subscribe transports for the conversation endpoint.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use pocketbot_config::{HttpConfig, PubSubConfig};

use crate::LlmError;

/// Direct synchronous request/response over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.server_url.clone(),
        })
    }

    pub async fn request(&self, body: &Value) -> Result<Value, LlmError> {
        debug!(url = %self.url, "Calling LLM endpoint");
        let resp = self.client.post(&self.url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Publish/subscribe alternative: the request is published with a unique
/// correlation id and the call blocks on a bounded wait for the reply
/// tagged with the same id. Expiry is reported as [`LlmError::Timeout`].
pub struct PubSubTransport {
    broker_url: String,
    request_topic: String,
    timeout: Duration,
}

impl PubSubTransport {
    pub fn new(config: &PubSubConfig) -> Self {
        Self {
            broker_url: config.broker_url.clone(),
            request_topic: config.request_topic.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub async fn request(&self, body: &Value) -> Result<Value, LlmError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let envelope = json!({
            "id": request_id,
            "topic": self.request_topic,
            "payload": body,
        });

        match tokio::time::timeout(self.timeout, self.exchange(&envelope, &request_id)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        }
    }

    async fn exchange(&self, envelope: &Value, request_id: &str) -> Result<Value, LlmError> {
        debug!(broker = %self.broker_url, request_id, "Publishing LLM request");
        let (mut ws, _) = connect_async(&self.broker_url).await?;
        ws.send(Message::Text(envelope.to_string().into())).await?;

        while let Some(frame) = ws.next().await {
            let Message::Text(text) = frame? else {
                continue;
            };
            let Ok(value) = serde_json::from_str::<Value>(&text) else {
                debug!("Skipping undecodable broker frame");
                continue;
            };
            if value.get("id").and_then(|v| v.as_str()) != Some(request_id) {
                continue;
            }
            let _ = ws.close(None).await;
            // Brokers either wrap the response in "payload" or send it bare.
            return Ok(match value.get("payload") {
                Some(payload) => payload.clone(),
                None => value,
            });
        }

        Err(LlmError::ConnectionClosed)
    }
}
