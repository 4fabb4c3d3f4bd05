//! Memory tools: `update_memory`, `add_or_update_contact`,
//! `update_short_term_memory`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use pocketbot_memory::{ContactUpdate, ShortTermUpdate};

use crate::{DeviceTool, ToolContext, ToolSpec};

pub struct UpdateMemoryTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl UpdateMemoryTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "update_memory",
            "Save a permanent note about the user",
            json!({
                "type": "object",
                "properties": {
                    "note": {"type": "string", "description": "What to remember."}
                },
                "required": ["note"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for UpdateMemoryTool {
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
        let note = args.get("note").and_then(|v| v.as_str()).unwrap_or_default();
        Ok(self.ctx.memory.append_note(note, Utc::now()))
    }
}

pub struct AddOrUpdateContactTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl AddOrUpdateContactTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "add_or_update_contact",
            "Add or update a contact. Use this when learning about new people or getting \
             more context on existing contacts.",
            json!({
                "type": "object",
                "properties": {
                    "number": {"type": "string", "description": "Phone number."},
                    "name": {"type": "string", "description": "The person's name."},
                    "relationship": {"type": "string", "description": "Relation to the owner (e.g. 'son', 'boss', 'friend')."},
                    "tone_preference": {"type": "string", "description": "Preferred tone (formal, normal, casual)."},
                    "context": {"type": "string", "description": "Extra context about the person."}
                },
                "required": ["number"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for AddOrUpdateContactTool {
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
        let update: ContactUpdate = match serde_json::from_value(args) {
            Ok(update) => update,
            Err(e) => return Ok(format!("Invalid contact: {e}")),
        };
        Ok(self.ctx.memory.upsert_contact(update))
    }
}

pub struct UpdateShortTermMemoryTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl UpdateShortTermMemoryTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "update_short_term_memory",
            "Update short-term memory with the current context, the user's activity, plans \
             and so on. Use this to remember important context from the conversation.",
            json!({
                "type": "object",
                "properties": {
                    "context": {"type": "string", "description": "General context (e.g. 'the user is at work')."},
                    "date": {"type": "string", "description": "Date, if relevant."},
                    "location": {"type": "string", "description": "The user's location."},
                    "activity": {"type": "string", "description": "What the user is doing."},
                    "plan": {"type": "string", "description": "Something the user plans to do later."}
                }
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for UpdateShortTermMemoryTool {
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
        let update: ShortTermUpdate = match serde_json::from_value(args) {
            Ok(update) => update,
            Err(e) => return Ok(format!("Invalid short-term update: {e}")),
        };
        Ok(self.ctx.memory.update_short_term(update))
    }
}
