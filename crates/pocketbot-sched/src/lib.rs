//! pocketbot-sched: scheduled task management.
//!
//! Persists tasks as a whole JSON document, decides when they are due, and
//! fires their action sequences through an [`ActionRunner`]. The scheduler is
//! the only writer of `last_run`, `next_run` and `enabled` after creation.

pub mod scheduler;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token in string arguments that resolves to the previous action's result
/// within the same firing. The first action of a firing sees an empty string.
pub const LAST_RESULT_PLACEHOLDER: &str = "{last_result}";

/// How a task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// Every `interval_minutes` minutes.
    Interval,
    /// Every day at `daily_time` (HH:MM, UTC).
    Daily,
    /// A single firing at `run_at`.
    Once,
    /// Anything else found in a persisted document. Rejected at creation,
    /// disabled if it ever comes up for firing.
    #[serde(other)]
    Unknown,
}

/// One step of a task: a tool name plus its argument object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: serde_json::Map<String, Value>,
}

/// A scheduled task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique id, generated at creation.
    pub id: String,
    /// Display label.
    pub name: String,
    pub schedule_type: ScheduleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_at: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Most recent firing time.
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Next firing time. `None` means the task is never picked up.
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
    /// Disabled tasks are skipped but retained (soft delete).
    pub enabled: bool,
}

/// Parameters for creating a task, as supplied by the `schedule_task` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_kind")]
    pub schedule_type: ScheduleKind,
    #[serde(default)]
    pub interval_minutes: Option<i64>,
    #[serde(default)]
    pub daily_time: Option<String>,
    #[serde(default)]
    pub run_at: Option<String>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

fn default_kind() -> ScheduleKind {
    ScheduleKind::Interval
}

impl Default for ScheduleKind {
    fn default() -> Self {
        default_kind()
    }
}

/// Validation failures when creating a task.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid schedule_type: expected interval, daily or once")]
    InvalidScheduleType,
    #[error("invalid interval_minutes: must be a positive integer")]
    InvalidInterval,
    #[error("invalid daily_time: expected HH:MM")]
    InvalidDailyTime,
    #[error("invalid run_at: expected an ISO-8601 timestamp")]
    InvalidTimestamp,
}

/// Executes one action of a firing and returns its result text.
///
/// Implementations never fail; faults come back as readable text so a bad
/// action cannot abort the rest of a task.
#[async_trait::async_trait]
pub trait ActionRunner: Send + Sync {
    async fn run(&self, tool_name: &str, args: Value) -> String;
}

/// Substitute the previous action's result into string-typed arguments.
/// Non-string values pass through unchanged; nesting is not traversed.
pub fn resolve_args(
    args: &serde_json::Map<String, Value>,
    last_result: &str,
) -> serde_json::Map<String, Value> {
    args.iter()
        .map(|(key, value)| {
            let resolved = match value {
                Value::String(s) => Value::String(s.replace(LAST_RESULT_PLACEHOLDER, last_result)),
                other => other.clone(),
            };
            (key.clone(), resolved)
        })
        .collect()
}
