//! Bounded conversation history log.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use pocketbot_types::HistoryEntry;

/// Entries kept on disk; older ones are silently dropped.
pub const MAX_HISTORY_ITEMS: usize = 30;

/// Most-recent entries served as LLM context.
pub const HISTORY_CONTEXT_ITEMS: usize = 12;

/// Append-only bounded log of role/content/timestamp entries.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Vec<HistoryEntry> {
        pocketbot_store::load_json(&self.path, Vec::new)
    }

    /// Append one entry, trimming the log to the newest `MAX_HISTORY_ITEMS`.
    pub fn append(&self, role: &str, content: &str, now: DateTime<Utc>) {
        let mut history = self.load();
        history.push(HistoryEntry {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: now,
        });
        if history.len() > MAX_HISTORY_ITEMS {
            history.drain(..history.len() - MAX_HISTORY_ITEMS);
        }
        if let Err(e) = pocketbot_store::save_json(&self.path, &history) {
            tracing::warn!(path = %self.path.display(), "Failed to persist history: {e}");
        }
    }

    /// The most recent entries used as conversation context.
    pub fn recent(&self) -> Vec<HistoryEntry> {
        let history = self.load();
        let skip = history.len().saturating_sub(HISTORY_CONTEXT_ITEMS);
        history.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_append_and_recent() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.json"));
        log.append("user", "hello", now());
        log.append("assistant", "hi there", now());

        let recent = log.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].role, "user");
        assert_eq!(recent[1].content, "hi there");
    }

    #[test]
    fn test_log_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.json"));
        for i in 0..40 {
            log.append("user", &format!("message {i}"), now());
        }

        let all = log.load();
        assert_eq!(all.len(), MAX_HISTORY_ITEMS);
        // The oldest entries were silently dropped.
        assert_eq!(all[0].content, "message 10");

        let recent = log.recent();
        assert_eq!(recent.len(), HISTORY_CONTEXT_ITEMS);
        assert_eq!(recent[0].content, "message 28");
        assert_eq!(recent[11].content, "message 39");
    }
}
