//! Best-effort extraction of user context after an answered turn.
//!
//! Pattern-based heuristics over the instruction text: date mentions stamp
//! the short-term date, location phrases capture a context snippet, plan
//! phrases record the message under today's plans. Everything here is
//! optional; callers swallow failures.

use chrono::{DateTime, Utc};

use crate::MemoryStore;

/// Characters of context captured around a location phrase.
const CONTEXT_SNIPPET_CHARS: usize = 50;

const DATE_MARKERS: [&str; 3] = ["today", "tomorrow", "tonight"];

const LOCATION_MARKERS: [&str; 7] = [
    "i'm at", "i am at", "i'm in", "i am in", "at work", "at home", "on my way to",
];

const PLAN_MARKERS: [&str; 5] = ["i'll", "i will", "going to", "planning to", "plan to"];

/// Update short-term memory from a completed turn. Returns whether anything
/// was stored. The assistant reply is accepted for symmetry with the turn
/// flow but the heuristics only read the user's message.
pub fn process_memory_update(
    store: &MemoryStore,
    user_message: &str,
    _assistant_reply: &str,
    now: DateTime<Utc>,
) -> bool {
    let mut doc = store.load();
    let mut updated = false;

    if DATE_MARKERS.iter().any(|m| find_ci(user_message, m).is_some()) {
        doc.short_term_memory.current_date = now.format("%Y-%m-%d").to_string();
        updated = true;
    }

    for marker in LOCATION_MARKERS {
        if let Some(idx) = find_ci(user_message, marker) {
            let snippet: String = user_message[idx..].chars().take(CONTEXT_SNIPPET_CHARS).collect();
            doc.short_term_memory.current_context = snippet;
            updated = true;
            break;
        }
    }

    if PLAN_MARKERS.iter().any(|m| find_ci(user_message, m).is_some()) {
        let plan = user_message.to_string();
        if !doc.short_term_memory.today_plans.contains(&plan) {
            doc.short_term_memory.today_plans.push(plan);
        }
        updated = true;
    }

    if updated {
        store.save(&doc);
    }
    updated
}

/// ASCII-case-insensitive substring search, returning a char-boundary index
/// into the original string.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let ned = needle.as_bytes();
    if ned.is_empty() || ned.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - ned.len()).find(|&i| {
        haystack.is_char_boundary(i) && hay[i..i + ned.len()].eq_ignore_ascii_case(ned)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::new(dir.path().join("user_profile.json"), "+4712345678")
    }

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_date_mention_stamps_current_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(process_memory_update(&store, "What's on my list today?", "…", now()));
        assert_eq!(store.load().short_term_memory.current_date, "2026-03-01");
    }

    #[test]
    fn test_location_phrase_captures_snippet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(process_memory_update(
            &store,
            "I'm at the office until five, remind me about the standup",
            "…",
            now()
        ));
        let context = store.load().short_term_memory.current_context;
        assert!(context.starts_with("I'm at the office"));
        assert!(context.chars().count() <= 50);
    }

    #[test]
    fn test_plan_phrase_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let msg = "I'll pick up groceries after work";
        assert!(process_memory_update(&store, msg, "…", now()));
        assert!(process_memory_update(&store, msg, "…", now()));
        assert_eq!(store.load().short_term_memory.today_plans.len(), 1);
    }

    #[test]
    fn test_unremarkable_message_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!process_memory_update(&store, "What is the battery level?", "87%", now()));
        let stm = store.load().short_term_memory;
        assert!(stm.current_context.is_empty());
        assert!(stm.current_date.is_empty());
        assert!(stm.today_plans.is_empty());
    }

    #[test]
    fn test_find_ci_is_boundary_safe() {
        // Multibyte characters before the match must not break slicing.
        let text = "Привет, I'm at home";
        let idx = find_ci(text, "i'm at").unwrap();
        assert!(text.is_char_boundary(idx));
        assert!(text[idx..].starts_with("I'm at"));
    }
}
