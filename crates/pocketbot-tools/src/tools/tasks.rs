//! `schedule_task`, `list_tasks` and `cancel_task` tools.
//!
//! Validation failures come back as readable result strings; nothing raised
//! by the scheduler reaches the conversation loop as an error.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use pocketbot_sched::ScheduleRequest;

use crate::{DeviceTool, ToolContext, ToolSpec};

pub struct ScheduleTaskTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl ScheduleTaskTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "schedule_task",
            "Schedule a task. schedule_type: interval, daily, once. Use daily_time (HH:MM) \
             for daily and run_at (ISO-8601) for once. actions is a list of tool_name and \
             tool_args. Use {last_result} to reference the previous tool result.",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Task name."},
                    "schedule_type": {"type": "string", "description": "interval, daily or once."},
                    "interval_minutes": {"type": "integer", "description": "How often, in minutes."},
                    "daily_time": {"type": "string", "description": "HH:MM for daily tasks."},
                    "run_at": {"type": "string", "description": "ISO-8601 instant for one-shot tasks."},
                    "actions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "tool_name": {"type": "string"},
                                "tool_args": {"type": "object"}
                            },
                            "required": ["tool_name"]
                        }
                    }
                },
                "required": ["name", "actions"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for ScheduleTaskTool {
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
        let request: ScheduleRequest = match serde_json::from_value(args) {
            Ok(request) => request,
            Err(e) => return Ok(format!("Invalid schedule request: {e}")),
        };
        match self.ctx.scheduler.schedule(request, Utc::now()).await {
            Ok(id) => Ok(format!("Task scheduled: {id}")),
            Err(e) => Ok(e.to_string()),
        }
    }
}

pub struct ListTasksTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl ListTasksTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "list_tasks",
            "List scheduled tasks",
            json!({"type": "object", "properties": {}}),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for ListTasksTool {
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
        let tasks = self.ctx.scheduler.list().await;
        Ok(serde_json::to_string_pretty(&tasks)?)
    }
}

pub struct CancelTaskTool {
    ctx: Arc<ToolContext>,
    spec: ToolSpec,
}

impl CancelTaskTool {
    pub fn new(ctx: Arc<ToolContext>) -> Self {
        let spec = ToolSpec::new(
            "cancel_task",
            "Disable a scheduled task",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "Id of the task."}
                },
                "required": ["task_id"]
            }),
        );
        Self { ctx, spec }
    }
}

#[async_trait::async_trait]
impl DeviceTool for CancelTaskTool {
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
        let Some(task_id) = args.get("task_id").and_then(|v| v.as_str()) else {
            return Ok("Missing task_id".to_string());
        };
        if self.ctx.scheduler.cancel(task_id).await {
            Ok("Task disabled".to_string())
        } else {
            Ok("Task not found".to_string())
        }
    }
}
