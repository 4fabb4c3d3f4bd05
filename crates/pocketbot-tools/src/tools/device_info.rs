//! Read-only device getters, each mapping to one gateway command.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::{DeviceTool, ToolContext, ToolSpec};

/// A zero-argument query against the device gateway.
pub struct DeviceQueryTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
    command: &'static str,
}

impl DeviceQueryTool {
    fn new(ctx: Arc<ToolContext>, name: &str, description: &str, command: &'static str) -> Self {
        let spec = ToolSpec::new(name, description, json!({"type": "object", "properties": {}}));
        Self { ctx, spec, command }
    }

    pub fn battery(ctx: Arc<ToolContext>) -> Self {
        Self::new(
            ctx,
            "get_battery_status",
            "Read the battery status",
            "termux-battery-status",
        )
    }

    pub fn wifi(ctx: Arc<ToolContext>) -> Self {
        Self::new(
            ctx,
            "get_wifi_info",
            "Read information about the WiFi connection",
            "termux-wifi-connectioninfo",
        )
    }

    pub fn location(ctx: Arc<ToolContext>) -> Self {
        Self::new(ctx, "get_location", "Read the GPS position", "termux-location")
    }

    pub fn device_info(ctx: Arc<ToolContext>) -> Self {
        Self::new(
            ctx,
            "get_device_info",
            "Read telephony/device information",
            "termux-telephony-deviceinfo",
        )
    }

    pub fn clipboard(ctx: Arc<ToolContext>) -> Self {
        Self::new(ctx, "get_clipboard", "Read the clipboard", "termux-clipboard-get")
    }
}

#[async_trait::async_trait]
impl DeviceTool for DeviceQueryTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(
        &self,
        _args: Value,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.ctx.gateway.invoke(self.command).await)
    }
}
