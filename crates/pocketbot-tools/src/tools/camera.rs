//! `take_photo` tool.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::{DeviceTool, ToolContext, ToolSpec};

pub struct TakePhotoTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl TakePhotoTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "take_photo",
            "Take a photo with the phone camera (rear camera by default)",
            json!({"type": "object", "properties": {}}),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for TakePhotoTool {
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
        let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
        let filename = format!("photo_{}.jpg", chrono::Utc::now().timestamp());
        let target = format!("{home}/storage/downloads/{filename}");
        self.ctx
            .gateway
            .invoke(&format!("termux-camera-photo -c 0 '{target}'"))
            .await;
        Ok(target)
    }
}
