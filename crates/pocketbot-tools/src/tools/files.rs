//! `list_files` and `read_file` tools.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::{DeviceTool, ToolContext, ToolSpec};

/// Lines served by `read_file`.
const READ_FILE_LINES: usize = 200;

pub struct ListFilesTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl ListFilesTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "list_files",
            "List files in a directory",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Directory to list."}
                }
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for ListFilesTool {
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
        let path = args
            .get("path")
            .and_then(|v| v.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or("~/storage");
        Ok(self.ctx.gateway.invoke(&format!("ls -al {path}")).await)
    }
}

pub struct ReadFileTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl ReadFileTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "read_file",
            "Read the first lines of a file",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "File path."}
                },
                "required": ["path"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for ReadFileTool {
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
        let Some(path) = args.get("path").and_then(|v| v.as_str()).filter(|p| !p.is_empty())
        else {
            return Ok("Missing file path".to_string());
        };
        Ok(self
            .ctx
            .gateway
            .invoke(&format!("sed -n '1,{READ_FILE_LINES}p' {path}"))
            .await)
    }
}
