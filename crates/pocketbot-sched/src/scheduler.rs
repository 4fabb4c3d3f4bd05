//! Due-detection, firing and rescheduling of tasks.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::store::TaskStore;
use crate::{ActionRunner, ScheduleError, ScheduleKind, ScheduleRequest, Task, resolve_args};

/// Owns the task list and all transitions of `last_run`/`next_run`/`enabled`.
pub struct Scheduler {
    store: TaskStore,
    tasks: RwLock<Vec<Task>>,
}

impl Scheduler {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            tasks: RwLock::new(Vec::new()),
        }
    }

    /// Load tasks from storage.
    pub async fn load(&self) {
        let tasks = self.store.load();
        info!("Loaded {} scheduled tasks", tasks.len());
        *self.tasks.write().await = tasks;
    }

    /// Validate a request, compute its first `next_run` anchored at `now`,
    /// append the task and persist. Returns the generated task id.
    pub async fn schedule(
        &self,
        request: ScheduleRequest,
        now: DateTime<Utc>,
    ) -> Result<String, ScheduleError> {
        let next_run = initial_next_run(&request, now)?;

        let id = uuid::Uuid::new_v4().to_string();
        let task = Task {
            name: request.name.unwrap_or_else(|| id.clone()),
            id: id.clone(),
            schedule_type: request.schedule_type,
            interval_minutes: request.interval_minutes,
            daily_time: request.daily_time,
            run_at: request.run_at,
            actions: request.actions,
            last_run: None,
            next_run: Some(next_run),
            enabled: true,
        };

        let mut tasks = self.tasks.write().await;
        tasks.push(task);
        self.store.save(&tasks);
        info!(task_id = %id, "Scheduled task");
        Ok(id)
    }

    /// Snapshot of all tasks in storage (creation) order.
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Disable every task with the given id. Returns whether any matched;
    /// a missing id is a no-op, not an error.
    pub async fn cancel(&self, id: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        let mut found = false;
        for task in tasks.iter_mut().filter(|t| t.id == id) {
            task.enabled = false;
            found = true;
        }
        if found {
            self.store.save(&tasks);
        }
        found
    }

    /// Fire every enabled task whose `next_run` is at or before `now`, then
    /// reschedule it anchored at `now` (never at the missed slot, so a
    /// backlog cannot cause catch-up bursts). Persists once at the end of
    /// the pass, and only if something fired.
    ///
    /// The task lock is not held while actions run, so an action may call
    /// back into the scheduler (schedule, list, cancel). Tasks are never
    /// removed, only appended or disabled, so the snapshot indices stay
    /// valid across the pass.
    pub async fn run_due_pass(&self, now: DateTime<Utc>, runner: &dyn ActionRunner) {
        let due: Vec<(usize, Task)> = {
            let tasks = self.tasks.read().await;
            tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.enabled && t.next_run.is_some_and(|n| n <= now))
                .map(|(i, t)| (i, t.clone()))
                .collect()
        };
        if due.is_empty() {
            return;
        }

        let mut fired = Vec::with_capacity(due.len());
        for (index, task) in due {
            info!(task_id = %task.id, name = %task.name, "Firing scheduled task");

            let mut last_result = String::new();
            for action in &task.actions {
                let args = resolve_args(&action.tool_args, &last_result);
                last_result = runner
                    .run(&action.tool_name, serde_json::Value::Object(args))
                    .await;
            }
            fired.push(index);
        }

        let mut tasks = self.tasks.write().await;
        for index in fired {
            let Some(task) = tasks.get_mut(index) else {
                continue;
            };
            task.last_run = Some(now);
            match task.schedule_type {
                ScheduleKind::Interval => match task.interval_minutes.filter(|m| *m > 0) {
                    Some(minutes) => task.next_run = Some(now + Duration::minutes(minutes)),
                    None => {
                        warn!(task_id = %task.id, "Interval task without a valid interval, disabling");
                        task.enabled = false;
                    }
                },
                ScheduleKind::Daily => {
                    match task.daily_time.as_deref().map(parse_daily_time) {
                        Some(Ok((hour, minute))) => {
                            task.next_run = Some(next_daily_occurrence(now, hour, minute));
                        }
                        _ => {
                            warn!(task_id = %task.id, "Daily task without a valid HH:MM, disabling");
                            task.enabled = false;
                        }
                    }
                }
                // A once task is spent after its single firing, whatever the
                // outcome of its actions. next_run is left stale.
                ScheduleKind::Once => task.enabled = false,
                ScheduleKind::Unknown => {
                    warn!(task_id = %task.id, "Unrecognized schedule type at firing time, disabling");
                    task.enabled = false;
                }
            }
        }
        self.store.save(&tasks);
    }
}

/// Compute the first `next_run` for a schedule request.
pub fn initial_next_run(
    request: &ScheduleRequest,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    match request.schedule_type {
        ScheduleKind::Interval => {
            let minutes = request
                .interval_minutes
                .filter(|m| *m > 0)
                .ok_or(ScheduleError::InvalidInterval)?;
            Ok(now + Duration::minutes(minutes))
        }
        ScheduleKind::Daily => {
            let time = request
                .daily_time
                .as_deref()
                .ok_or(ScheduleError::InvalidDailyTime)?;
            let (hour, minute) = parse_daily_time(time)?;
            Ok(next_daily_occurrence(now, hour, minute))
        }
        ScheduleKind::Once => {
            let run_at = request
                .run_at
                .as_deref()
                .ok_or(ScheduleError::InvalidTimestamp)?;
            parse_run_at(run_at)
        }
        ScheduleKind::Unknown => Err(ScheduleError::InvalidScheduleType),
    }
}

/// Parse "HH:MM": exactly two colon-separated numeric fields, in range.
pub fn parse_daily_time(value: &str) -> Result<(u32, u32), ScheduleError> {
    let mut parts = value.split(':');
    let (Some(hour), Some(minute), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ScheduleError::InvalidDailyTime);
    };
    let hour: u32 = hour.trim().parse().map_err(|_| ScheduleError::InvalidDailyTime)?;
    let minute: u32 = minute.trim().parse().map_err(|_| ScheduleError::InvalidDailyTime)?;
    if hour > 23 || minute > 59 {
        return Err(ScheduleError::InvalidDailyTime);
    }
    Ok((hour, minute))
}

/// Today at HH:MM if still in the future, otherwise tomorrow.
pub fn next_daily_occurrence(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    // hour/minute are range-checked by parse_daily_time
    let today = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .expect("validated HH:MM");
    let candidate = Utc.from_utc_datetime(&today);
    if candidate <= now {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}

/// Parse a `run_at` instant: RFC 3339 with offset, or a naive ISO-8601
/// timestamp interpreted as UTC.
pub fn parse_run_at(value: &str) -> Result<DateTime<Utc>, ScheduleError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    value
        .parse::<NaiveDateTime>()
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| ScheduleError::InvalidTimestamp)
}
