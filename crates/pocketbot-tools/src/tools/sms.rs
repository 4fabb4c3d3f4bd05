//! `send_sms` and `send_mms` tools.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::{DeviceTool, ToolContext, ToolSpec};

pub struct SendSmsTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl SendSmsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "send_sms",
            "Send an SMS to a number. Use this for every final answer to the user.",
            json!({
                "type": "object",
                "properties": {
                    "number": {"type": "string", "description": "Recipient phone number."},
                    "message": {"type": "string", "description": "Message text."}
                },
                "required": ["message"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for SendSmsTool {
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
        let number = args
            .get("number")
            .and_then(|v| v.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.ctx.owner_number)
            .to_string();
        let message = args.get("message").and_then(|v| v.as_str()).unwrap_or_default();

        self.ctx
            .gateway
            .invoke(&format!("termux-sms-send -n {number} \"{message}\""))
            .await;
        Ok(format!("SMS sent to {number}"))
    }
}

pub struct SendMmsTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl SendMmsTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "send_mms",
            "Send an MMS with an attachment",
            json!({
                "type": "object",
                "properties": {
                    "number": {"type": "string", "description": "Recipient phone number."},
                    "message": {"type": "string", "description": "Message text."},
                    "file_path": {"type": "string", "description": "Path to the attachment."}
                },
                "required": ["file_path"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for SendMmsTool {
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
        let number = args
            .get("number")
            .and_then(|v| v.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.ctx.owner_number)
            .to_string();
        let message = args.get("message").and_then(|v| v.as_str()).unwrap_or_default();
        let Some(file_path) = args.get("file_path").and_then(|v| v.as_str()) else {
            return Ok("MMS failed: missing file path".to_string());
        };

        self.ctx
            .gateway
            .invoke(&format!(
                "termux-sms-send -n {number} -a \"{file_path}\" \"{message}\""
            ))
            .await;
        Ok(format!("MMS sent to {number}: {file_path}"))
    }
}
