//! pocketbot-store: whole-document JSON persistence.
//!
//! Every persisted resource (tasks, memory, history, agent state) is a single
//! JSON document owned by exactly one repository object per process. Reads
//! that fail for any reason fall back to a well-defined default document;
//! the caller decides what to do about failed writes.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Load a JSON document, falling back to `default` when the file is missing
/// or unreadable. A corrupt store must never take the agent down.
pub fn load_json<T, F>(path: &Path, default: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Corrupt JSON document, using default: {e}");
                default()
            }
        },
        Err(_) => default(),
    }
}

/// Save a JSON document, replacing the whole file.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Paths of every document under the agent's data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.root.join("tasks.json")
    }

    pub fn history_file(&self) -> PathBuf {
        self.root.join("history.json")
    }

    pub fn memory_file(&self) -> PathBuf {
        self.root.join("user_profile.json")
    }

    /// Create the directory and seed any missing documents with `seed`.
    ///
    /// Existing documents are left untouched.
    pub fn ensure<T: Serialize>(&self, path: &Path, seed: &T) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        if !path.exists() {
            save_json(path, seed)?;
        }
        Ok(())
    }
}

/// Mutable agent state that must survive restarts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StateDoc {
    /// Highest inbox message id already handled.
    #[serde(default)]
    pub last_seen_sms_id: i64,
}

impl Default for StateDoc {
    fn default() -> Self {
        Self { last_seen_sms_id: 0 }
    }
}

/// Repository for the agent state document.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> StateDoc {
        load_json(&self.path, StateDoc::default)
    }

    pub fn save(&self, state: &StateDoc) {
        if let Err(e) = save_json(&self.path, state) {
            tracing::warn!(path = %self.path.display(), "Failed to persist agent state: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let state: StateDoc = load_json(&dir.path().join("nope.json"), StateDoc::default);
        assert_eq!(state.last_seen_sms_id, 0);
    }

    #[test]
    fn test_load_corrupt_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let state: StateDoc = load_json(&path, StateDoc::default);
        assert_eq!(state.last_seen_sms_id, 0);
    }

    #[test]
    fn test_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let mut state = store.load();
        state.last_seen_sms_id = 1234;
        store.save(&state);
        assert_eq!(store.load().last_seen_sms_id, 1234);
    }

    #[test]
    fn test_ensure_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path().join("data"));
        data.ensure(&data.state_file(), &StateDoc::default()).unwrap();
        assert!(data.state_file().exists());

        // Seeding again must not overwrite an existing document.
        let store = StateStore::new(data.state_file());
        let mut state = store.load();
        state.last_seen_sms_id = 9;
        store.save(&state);
        data.ensure(&data.state_file(), &StateDoc::default()).unwrap();
        assert_eq!(store.load().last_seen_sms_id, 9);
    }
}
