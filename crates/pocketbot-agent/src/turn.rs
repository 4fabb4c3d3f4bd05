//! One instruction-to-answer cycle.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use pocketbot_llm::LlmBackend;
use pocketbot_llm::normalize::{LlmReply, normalize_reply};
use pocketbot_memory::history::HistoryLog;
use pocketbot_memory::{MemoryStore, recall};
use pocketbot_tools::ToolRegistry;
use pocketbot_types::ChatMessage;

use crate::prompt;

/// Request/response exchanges allowed for a single instruction. The cap is
/// the only safeguard against runaway tool-call chains.
pub const MAX_TOOL_STEPS: usize = 8;

/// Everything a turn needs.
pub struct TurnContext {
    pub llm: Arc<dyn LlmBackend>,
    pub tools: Arc<ToolRegistry>,
    pub memory: Arc<MemoryStore>,
    pub history: HistoryLog,
}

/// Drive one instruction to completion. Returns the final answer text, or
/// `None` when the step budget ran out or the endpoint produced nothing
/// usable; in both cases the turn ends without a user-visible reply and the
/// caller's polling loop is unaffected.
pub async fn run_turn(instruction: &str, ctx: &TurnContext) -> Option<String> {
    let mut messages = build_context(instruction, ctx);
    // Recorded up front so the instruction survives even if the turn fails.
    ctx.history.append("user", instruction, Utc::now());

    let tool_defs = ctx.tools.definitions();
    let mut final_answer: Option<String> = None;

    for step in 0..MAX_TOOL_STEPS {
        let raw = match ctx.llm.chat(&messages, &tool_defs).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(step, "LLM request failed, ending turn: {e}");
                break;
            }
        };

        match normalize_reply(Some(raw)) {
            LlmReply::ToolCalls { assistant, calls } => {
                messages.push(assistant);
                for call in calls {
                    let args = serde_json::from_str(&call.function.arguments)
                        .unwrap_or_else(|_| json!({}));
                    info!(tool = %call.function.name, "Running tool");
                    let result = ctx.tools.execute(&call.function.name, args).await;
                    messages.push(ChatMessage::tool_result(
                        call.id,
                        call.function.name,
                        result,
                    ));
                }
            }
            LlmReply::Answer { assistant, text } => {
                messages.push(assistant);
                info!("Answering: {text}");
                ctx.history.append("assistant", &text, Utc::now());
                let delivery = ctx.tools.execute("send_sms", json!({ "message": text })).await;
                debug!(%delivery, "Delivered final answer");
                final_answer = Some(text);
                break;
            }
            LlmReply::Silent { assistant } => {
                // A recognizable but empty message still consumes a step.
                messages.push(assistant);
            }
            LlmReply::Unrecognized => {
                warn!(step, "Could not interpret LLM response, ending turn");
                break;
            }
        }
    }

    // Best-effort context extraction; never affects the answer.
    if let Some(answer) = &final_answer {
        if recall::process_memory_update(&ctx.memory, instruction, answer, Utc::now()) {
            debug!("Short-term memory updated from this turn");
        }
    }

    final_answer
}

/// system prompt + memory snapshot + bounded recent history + instruction.
fn build_context(instruction: &str, ctx: &TurnContext) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    messages.push(ChatMessage::system(prompt::system_prompt(Utc::now())));

    let memory_context = ctx.memory.context_for_prompt();
    if memory_context.is_empty() {
        let doc = ctx.memory.load();
        let dump = serde_json::to_string(&doc).unwrap_or_default();
        messages.push(ChatMessage::system(format!("MEMORY: {dump}")));
    } else {
        messages.push(ChatMessage::system(memory_context));
    }

    for entry in ctx.history.recent() {
        messages.push(ChatMessage {
            role: entry.role,
            content: Some(entry.content),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        });
    }

    messages.push(ChatMessage::user(instruction));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocketbot_llm::LlmError;
    use pocketbot_sched::scheduler::Scheduler;
    use pocketbot_sched::store::TaskStore;
    use pocketbot_tools::{CommandGateway, ToolContext, create_registry};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend stub replaying canned responses; repeats the last one forever.
    struct StubBackend {
        responses: Mutex<VecDeque<Value>>,
        last: Value,
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn new(responses: Vec<Value>) -> Self {
            let last = responses.last().cloned().unwrap_or(Value::Null);
            Self {
                responses: Mutex::new(responses.into()),
                last,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl LlmBackend for StubBackend {
        async fn chat(&self, _messages: &[ChatMessage], _tools: &[Value]) -> Result<Value, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.last.clone()))
        }
    }

    struct StubGateway {
        commands: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl CommandGateway for StubGateway {
        async fn invoke(&self, command: &str) -> String {
            self.commands.lock().unwrap().push(command.to_string());
            "ok".to_string()
        }
    }

    fn tool_call_response(name: &str) -> Value {
        json!({
            "choices": [{"message": {
                "role": "assistant",
                "tool_calls": [{"id": "c1", "type": "function",
                                "function": {"name": name, "arguments": "{}"}}]
            }}]
        })
    }

    fn answer_response(text: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
    }

    fn context_with(
        dir: &tempfile::TempDir,
        backend: Arc<StubBackend>,
        gateway: Arc<StubGateway>,
    ) -> TurnContext {
        let memory = Arc::new(MemoryStore::new(
            dir.path().join("user_profile.json"),
            "+4712345678",
        ));
        let scheduler = Arc::new(Scheduler::new(TaskStore::new(dir.path().join("tasks.json"))));
        let tools = Arc::new(create_registry(Arc::new(ToolContext {
            gateway,
            memory: memory.clone(),
            scheduler,
            owner_number: "+4712345678".to_string(),
        })));
        TurnContext {
            llm: backend,
            tools,
            memory,
            history: HistoryLog::new(dir.path().join("history.json")),
        }
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(StubBackend::new(vec![
            tool_call_response("get_battery_status"),
            answer_response("Battery is fine."),
        ]));
        let gateway = Arc::new(StubGateway { commands: Mutex::new(Vec::new()) });
        let ctx = context_with(&dir, backend.clone(), gateway.clone());

        let answer = run_turn("how is the battery?", &ctx).await;
        assert_eq!(answer.as_deref(), Some("Battery is fine."));
        assert_eq!(backend.calls(), 2);

        // The final answer went out through the send-SMS tool path.
        let commands = gateway.commands.lock().unwrap().clone();
        assert!(commands.iter().any(|c| c.starts_with("termux-battery-status")));
        assert!(commands.iter().any(|c| c.contains("termux-sms-send") && c.contains("Battery is fine.")));

        // Both sides of the turn were logged.
        let history = ctx.history.load();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_loop_is_bounded_by_max_tool_steps() {
        let dir = tempfile::tempdir().unwrap();
        // Every response keeps asking for more tool calls.
        let backend = Arc::new(StubBackend::new(vec![tool_call_response("get_location")]));
        let gateway = Arc::new(StubGateway { commands: Mutex::new(Vec::new()) });
        let ctx = context_with(&dir, backend.clone(), gateway);

        let answer = run_turn("track me forever", &ctx).await;
        assert!(answer.is_none());
        assert_eq!(backend.calls(), MAX_TOOL_STEPS);
    }

    #[tokio::test]
    async fn test_unrecognized_response_ends_turn_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(StubBackend::new(vec![json!({"status": "overloaded"})]));
        let gateway = Arc::new(StubGateway { commands: Mutex::new(Vec::new()) });
        let ctx = context_with(&dir, backend.clone(), gateway.clone());

        let answer = run_turn("hello?", &ctx).await;
        assert!(answer.is_none());
        assert_eq!(backend.calls(), 1);
        // No reply was sent, but the instruction is on record.
        assert!(gateway.commands.lock().unwrap().is_empty());
        let history = ctx.history.load();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello?");
    }

    #[tokio::test]
    async fn test_answered_turn_updates_short_term_memory() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(StubBackend::new(vec![answer_response("Noted!")]));
        let gateway = Arc::new(StubGateway { commands: Mutex::new(Vec::new()) });
        let ctx = context_with(&dir, backend, gateway);

        run_turn("I'm at work until five", &ctx).await;
        let stm = ctx.memory.load().short_term_memory;
        assert!(stm.current_context.starts_with("I'm at work"));
    }
}
