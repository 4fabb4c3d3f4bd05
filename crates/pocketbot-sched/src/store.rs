//! JSON-backed task storage.

use std::path::PathBuf;

use crate::Task;

/// Persistent storage for the task list, read and written as one document.
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load all tasks. Missing or corrupt documents yield an empty list.
    pub fn load(&self) -> Vec<Task> {
        pocketbot_store::load_json(&self.path, Vec::new)
    }

    /// Persist the whole task list. Write faults are logged, not propagated;
    /// the next pass will retry with the in-memory state.
    pub fn save(&self, tasks: &[Task]) {
        if let Err(e) = pocketbot_store::save_json(&self.path, &tasks) {
            tracing::warn!(path = %self.path.display(), "Failed to persist tasks: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScheduleKind;

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));
        assert!(store.load().is_empty());

        let task = Task {
            id: "t1".into(),
            name: "ping".into(),
            schedule_type: ScheduleKind::Interval,
            interval_minutes: Some(5),
            daily_time: None,
            run_at: None,
            actions: Vec::new(),
            last_run: None,
            next_run: None,
            enabled: true,
        };
        store.save(std::slice::from_ref(&task));

        let loaded = store.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "t1");
        assert_eq!(loaded[0].schedule_type, ScheduleKind::Interval);
    }

    #[test]
    fn test_corrupt_document_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "[{broken").unwrap();
        let store = TaskStore::new(path);
        assert!(store.load().is_empty());
    }
}
