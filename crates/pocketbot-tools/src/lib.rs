//! pocketbot-tools: tool dispatch for the agent and the scheduler.
//!
//! Provides:
//! - The `DeviceTool` trait and per-tool JSON-schema specs
//! - `ToolRegistry`, the single point mapping a tool name + arguments to an
//!   effect and a result string (fail-soft: unknown names and faults come
//!   back as readable text, never as errors)
//! - The `CommandGateway` seam to the device and its Termux implementation

pub mod context;
pub mod gateway;
pub mod tools;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

pub use context::ToolContext;
pub use gateway::{CommandGateway, TermuxGateway};

/// A tool's declared interface, passed verbatim to the LLM endpoint.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// The wire-format function declaration.
    pub fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// A named, side-effecting operation the model (or the scheduler) can invoke.
#[async_trait::async_trait]
pub trait DeviceTool: Send + Sync {
    fn name(&self) -> &str;
    fn spec(&self) -> &ToolSpec;
    async fn execute(&self, args: Value)
    -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Registry of all tools, keyed by name. Holds no state of its own.
pub struct ToolRegistry {
    order: Vec<Arc<dyn DeviceTool>>,
    by_name: HashMap<String, Arc<dyn DeviceTool>>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn DeviceTool>>) -> Self {
        let by_name = tools
            .iter()
            .map(|t| (t.name().to_string(), t.clone()))
            .collect();
        Self {
            order: tools,
            by_name,
        }
    }

    /// The full tool catalog in wire format, in registration order.
    pub fn definitions(&self) -> Vec<Value> {
        self.order.iter().map(|t| t.spec().definition()).collect()
    }

    /// Execute a tool by name. Never fails: unknown names return a sentinel
    /// string and execution faults are converted to a readable result, so a
    /// bad call cannot abort a multi-action task or a conversation turn.
    pub async fn execute(&self, name: &str, args: Value) -> String {
        debug!(tool = name, "Dispatching tool");
        match self.by_name.get(name) {
            Some(tool) => match tool.execute(args).await {
                Ok(text) => text,
                Err(e) => format!("Tool error: {e}"),
            },
            None => format!("Unknown tool: {name}"),
        }
    }
}

#[async_trait::async_trait]
impl pocketbot_sched::ActionRunner for ToolRegistry {
    async fn run(&self, tool_name: &str, args: Value) -> String {
        self.execute(tool_name, args).await
    }
}

/// Build the registry with the complete tool catalog.
pub fn create_registry(ctx: Arc<ToolContext>) -> ToolRegistry {
    ToolRegistry::new(tools::create_device_tools(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BoomTool {
        spec: ToolSpec,
    }

    #[async_trait::async_trait]
    impl DeviceTool for BoomTool {
        fn name(&self) -> &str {
            "boom"
        }

        fn spec(&self) -> &ToolSpec {
            &self.spec
        }

        async fn execute(
            &self,
            _args: Value,
        ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err("device unavailable".into())
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_sentinel() {
        let registry = ToolRegistry::new(Vec::new());
        let result = registry.execute("no_such_tool", json!({})).await;
        assert_eq!(result, "Unknown tool: no_such_tool");
    }

    #[tokio::test]
    async fn test_faults_become_result_text() {
        let registry = ToolRegistry::new(vec![Arc::new(BoomTool {
            spec: ToolSpec::new("boom", "always fails", json!({"type": "object", "properties": {}})),
        })]);
        let result = registry.execute("boom", json!({})).await;
        assert_eq!(result, "Tool error: device unavailable");
    }

    #[test]
    fn test_definition_wire_shape() {
        let spec = ToolSpec::new(
            "get_battery_status",
            "Read the battery status",
            json!({"type": "object", "properties": {}}),
        );
        let def = spec.definition();
        assert_eq!(def["type"], json!("function"));
        assert_eq!(def["function"]["name"], json!("get_battery_status"));
    }
}
