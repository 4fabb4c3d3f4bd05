use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ──────────────────── Chat Types ────────────────────

/// A single message in an LLM conversation, in the chat-completion wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role: "system", "user", "assistant" or "tool".
    /// Some backends omit it on their own messages, so it defaults to
    /// "assistant" when deserializing.
    #[serde(default = "default_role")]
    pub role: String,
    /// Text content. Absent on assistant messages that only carry tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Identifier of the tool call this message answers (role "tool" only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name for role "tool" messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text("assistant", content)
    }

    /// A tool-role message carrying one tool call's result.
    pub fn tool_result(call_id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }

    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, echoed back in the tool-role reply.
    #[serde(default)]
    pub id: String,
    /// Always "function" on the wire.
    #[serde(rename = "type", default = "default_call_kind")]
    pub kind: String,
    pub function: ToolFunction,
}

/// The function half of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    /// JSON-encoded argument object.
    #[serde(default = "default_arguments")]
    pub arguments: String,
}

fn default_role() -> String {
    "assistant".to_string()
}

fn default_call_kind() -> String {
    "function".to_string()
}

fn default_arguments() -> String {
    "{}".to_string()
}

// ──────────────────── History Types ────────────────────

/// One entry in the bounded conversation history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

// ──────────────────── Channel Types ────────────────────

/// A message as reported by the device SMS inbox listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundSms {
    /// Monotonic message id assigned by the device.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Sender phone number.
    #[serde(default)]
    pub number: Option<String>,
    /// Message text.
    #[serde(default)]
    pub body: Option<String>,
    /// Folder the message sits in ("inbox", "sent", ...).
    #[serde(rename = "type", default)]
    pub folder: Option<String>,
}

impl InboundSms {
    pub fn is_inbox(&self) -> bool {
        self.folder.as_deref() == Some("inbox")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_tool_call_roundtrip() {
        let msg = ChatMessage {
            role: "assistant".into(),
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                kind: "function".into(),
                function: ToolFunction {
                    name: "get_battery_status".into(),
                    arguments: "{}".into(),
                },
            }],
            tool_call_id: None,
            name: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"function\""));
        assert!(!json.contains("\"content\""));
        let parsed: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tool_calls.len(), 1);
        assert_eq!(parsed.tool_calls[0].function.name, "get_battery_status");
    }

    #[test]
    fn test_tool_call_defaults() {
        // Providers sometimes omit "type" and "arguments"; both must default.
        let json = r#"{"id":"c1","function":{"name":"get_location"}}"#;
        let call: ToolCall = serde_json::from_str(json).unwrap();
        assert_eq!(call.kind, "function");
        assert_eq!(call.function.arguments, "{}");
    }

    #[test]
    fn test_tool_result_message() {
        let msg = ChatMessage::tool_result("c1", "send_sms", "SMS sent");
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_call_id.as_deref(), Some("c1"));
        assert_eq!(msg.name.as_deref(), Some("send_sms"));
    }

    #[test]
    fn test_inbound_sms_parse() {
        let json = r#"{"_id": 42, "number": "+47 123 45 678", "body": "hello", "type": "inbox"}"#;
        let sms: InboundSms = serde_json::from_str(json).unwrap();
        assert_eq!(sms.id, 42);
        assert!(sms.is_inbox());
    }

    #[test]
    fn test_inbound_sms_missing_fields() {
        let json = r#"{"_id": 7}"#;
        let sms: InboundSms = serde_json::from_str(json).unwrap();
        assert!(sms.number.is_none());
        assert!(sms.body.is_none());
        assert!(!sms.is_inbox());
    }
}
