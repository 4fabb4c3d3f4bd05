//! Response normalization.
//!
//! Backends answer in one of several shapes: the chat-completion document
//! (`{choices:[{message:{…}}]}`), a simplified `{answer: "…"}`, or a bare
//! `{message:{…}}`. All of them normalize to one [`LlmReply`]; anything
//! else is `Unrecognized` and ends the turn.

use serde_json::{Value, json};

use pocketbot_types::{ChatMessage, ToolCall};

/// What one endpoint exchange amounts to.
#[derive(Debug, Clone)]
pub enum LlmReply {
    /// The model requested tool calls; dispatch them and keep stepping.
    ToolCalls {
        assistant: ChatMessage,
        calls: Vec<ToolCall>,
    },
    /// A final textual answer.
    Answer {
        assistant: ChatMessage,
        text: String,
    },
    /// A recognizable message with neither content nor tool calls; the
    /// message is still appended and the loop takes another step.
    Silent { assistant: ChatMessage },
    /// Nothing usable came back.
    Unrecognized,
}

/// Normalize a raw response document (or its absence) into an [`LlmReply`].
pub fn normalize_reply(raw: Option<Value>) -> LlmReply {
    let Some(raw) = raw else {
        return LlmReply::Unrecognized;
    };

    let message_value = if raw.get("choices").is_some() {
        raw.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .cloned()
    } else if let Some(answer) = raw.get("answer").and_then(|v| v.as_str()) {
        Some(json!({ "role": "assistant", "content": answer }))
    } else if raw.get("message").is_some_and(|m| m.is_object()) {
        raw.get("message").cloned()
    } else {
        None
    };

    let Some(message_value) = message_value else {
        return LlmReply::Unrecognized;
    };
    let Ok(assistant) = serde_json::from_value::<ChatMessage>(message_value) else {
        return LlmReply::Unrecognized;
    };

    if !assistant.tool_calls.is_empty() {
        let calls = assistant.tool_calls.clone();
        LlmReply::ToolCalls { assistant, calls }
    } else if let Some(text) = assistant.content.clone().filter(|t| !t.is_empty()) {
        LlmReply::Answer { assistant, text }
    } else {
        LlmReply::Silent { assistant }
    }
}
