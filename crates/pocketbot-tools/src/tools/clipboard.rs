//! `set_clipboard` tool.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::{DeviceTool, ToolContext, ToolSpec};

pub struct SetClipboardTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl SetClipboardTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "set_clipboard",
            "Write text to the clipboard",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text for the clipboard."}
                },
                "required": ["text"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for SetClipboardTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(
        &self,
        args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        self.ctx
            .gateway
            .invoke(&format!("termux-clipboard-set '{text}'"))
            .await;
        Ok("Clipboard updated".to_string())
    }
}
