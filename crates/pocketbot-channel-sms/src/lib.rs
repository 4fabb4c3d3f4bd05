//! pocketbot-channel-sms: the SMS inbox channel.
//!
//! Polls the device inbox through the command gateway, hands owner messages
//! to the agent as instructions, and notifies the owner about messages from
//! anyone else. The highest handled message id is persisted so restarts do
//! not replay old messages.

use std::sync::Arc;

use tracing::{info, warn};

use pocketbot_memory::{MemoryStore, normalize_number};
use pocketbot_store::StateStore;
use pocketbot_tools::CommandGateway;
use pocketbot_types::InboundSms;

/// Messages fetched per inbox listing.
const INBOX_LIST_LIMIT: usize = 20;

/// Characters of a third-party message shown in the owner notification.
const MAX_NOTIFICATION_LENGTH: usize = 100;

/// Cursor value parking the channel when the initial sync fails; nothing in
/// a real inbox reaches this id, so stale messages stay ignored.
const UNSYNCED_SENTINEL: i64 = 999_999_999;

/// Digits of the owner number compared against sender numbers.
const OWNER_SUFFIX_DIGITS: usize = 8;

pub struct SmsChannel {
    gateway: Arc<dyn CommandGateway>,
    state: StateStore,
    memory: Arc<MemoryStore>,
    owner_number: String,
}

impl SmsChannel {
    pub fn new(
        gateway: Arc<dyn CommandGateway>,
        state: StateStore,
        memory: Arc<MemoryStore>,
        owner_number: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            state,
            memory,
            owner_number: owner_number.into(),
        }
    }

    /// Advance the cursor past everything currently in the inbox so old
    /// messages are ignored. When the inbox cannot be read the cursor is
    /// parked at a sentinel instead.
    pub async fn sync_inbox(&self) {
        let mut state = self.state.load();
        match self.list_inbox().await {
            Some(messages) => {
                state.last_seen_sms_id = messages
                    .iter()
                    .filter(|m| m.is_inbox())
                    .map(|m| m.id)
                    .max()
                    .unwrap_or(0);
                info!(
                    last_seen = state.last_seen_sms_id,
                    "Inbox synced, ignoring older messages"
                );
            }
            None => {
                warn!("Could not sync inbox, parking the cursor");
                state.last_seen_sms_id = UNSYNCED_SENTINEL;
            }
        }
        self.state.save(&state);
    }

    /// Check for new messages. Returns the first unhandled instruction from
    /// the owner, if any; other senders' messages trigger an owner
    /// notification and are consumed.
    pub async fn poll(&self) -> Option<String> {
        let messages = self.list_inbox().await?;
        let mut state = self.state.load();

        for msg in &messages {
            if !msg.is_inbox() || msg.id <= state.last_seen_sms_id {
                continue;
            }
            state.last_seen_sms_id = msg.id;
            self.state.save(&state);

            let sender = msg.number.clone().unwrap_or_default();
            let body = msg.body.clone().unwrap_or_default();
            if self.is_from_owner(&sender) {
                if body.trim().is_empty() {
                    continue;
                }
                return Some(body);
            }
            self.notify_owner(&sender, &body).await;
        }
        None
    }

    async fn list_inbox(&self) -> Option<Vec<InboundSms>> {
        let raw = self
            .gateway
            .invoke(&format!("termux-sms-list -l {INBOX_LIST_LIMIT}"))
            .await;
        if raw.is_empty() || raw == "[]" {
            return None;
        }
        match serde_json::from_str::<Vec<InboundSms>>(&raw) {
            Ok(mut messages) => {
                messages.sort_by_key(|m| m.id);
                Some(messages)
            }
            Err(e) => {
                warn!("Could not parse inbox listing: {e}");
                None
            }
        }
    }

    /// Owner detection by number suffix, tolerant of formatting and
    /// country-prefix differences.
    fn is_from_owner(&self, sender: &str) -> bool {
        let owner = normalize_number(&self.owner_number);
        if owner.is_empty() {
            return false;
        }
        let suffix_start = owner.len().saturating_sub(OWNER_SUFFIX_DIGITS);
        normalize_number(sender).ends_with(&owner[suffix_start..])
    }

    /// Forward a third-party message to the owner, labeled with the sender's
    /// contact entry when one exists.
    async fn notify_owner(&self, sender: &str, body: &str) {
        let sender_info = match self.memory.lookup_contact(sender) {
            Some(contact) => {
                let name = if contact.name.is_empty() {
                    sender.to_string()
                } else {
                    contact.name
                };
                if contact.relationship.is_empty() {
                    name
                } else {
                    format!("{name} ({})", contact.relationship)
                }
            }
            None => sender.to_string(),
        };

        let mut snippet: String = body.chars().take(MAX_NOTIFICATION_LENGTH).collect();
        if body.chars().count() > MAX_NOTIFICATION_LENGTH {
            snippet.push_str("...");
        }

        let notification = format!("New SMS from {sender_info}: {snippet}");
        self.gateway
            .invoke(&format!(
                "termux-sms-send -n {} \"{notification}\"",
                self.owner_number
            ))
            .await;
        info!(sender = %sender_info, "Notified owner about third-party SMS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubGateway {
        commands: Mutex<Vec<String>>,
        inbox_json: Mutex<String>,
    }

    impl StubGateway {
        fn new(inbox_json: &str) -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                inbox_json: Mutex::new(inbox_json.to_string()),
            }
        }

        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CommandGateway for StubGateway {
        async fn invoke(&self, command: &str) -> String {
            self.commands.lock().unwrap().push(command.to_string());
            if command.starts_with("termux-sms-list") {
                self.inbox_json.lock().unwrap().clone()
            } else {
                String::new()
            }
        }
    }

    fn channel_with(
        dir: &tempfile::TempDir,
        gateway: Arc<StubGateway>,
    ) -> SmsChannel {
        let memory = Arc::new(MemoryStore::new(
            dir.path().join("user_profile.json"),
            "+4712345678",
        ));
        SmsChannel::new(
            gateway,
            StateStore::new(dir.path().join("state.json")),
            memory,
            "+4712345678",
        )
    }

    #[tokio::test]
    async fn test_sync_inbox_advances_past_existing() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubGateway::new(
            r#"[{"_id": 3, "type": "inbox", "number": "+4712345678", "body": "old"},
                {"_id": 9, "type": "inbox", "number": "+4712345678", "body": "older"},
                {"_id": 11, "type": "sent", "number": "x", "body": "out"}]"#,
        ));
        let channel = channel_with(&dir, gateway);
        channel.sync_inbox().await;

        assert_eq!(
            StateStore::new(dir.path().join("state.json")).load().last_seen_sms_id,
            9
        );
    }

    #[tokio::test]
    async fn test_sync_failure_parks_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubGateway::new("termux-api not installed"));
        let channel = channel_with(&dir, gateway);
        channel.sync_inbox().await;

        assert_eq!(
            StateStore::new(dir.path().join("state.json")).load().last_seen_sms_id,
            999_999_999
        );
    }

    #[tokio::test]
    async fn test_poll_returns_owner_instruction_once() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubGateway::new(
            r#"[{"_id": 5, "type": "inbox", "number": "+47 123 45 678", "body": "battery?"}]"#,
        ));
        let channel = channel_with(&dir, gateway);

        assert_eq!(channel.poll().await.as_deref(), Some("battery?"));
        // The cursor advanced, so a second poll finds nothing new.
        assert_eq!(channel.poll().await, None);
    }

    #[tokio::test]
    async fn test_poll_ignores_already_seen_and_sent() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubGateway::new(
            r#"[{"_id": 2, "type": "inbox", "number": "+4712345678", "body": "old"},
                {"_id": 6, "type": "sent", "number": "+4712345678", "body": "out"}]"#,
        ));
        let channel = channel_with(&dir, gateway.clone());
        let state = StateStore::new(dir.path().join("state.json"));
        let mut doc = state.load();
        doc.last_seen_sms_id = 4;
        state.save(&doc);

        assert_eq!(channel.poll().await, None);
        assert_eq!(state.load().last_seen_sms_id, 4);
    }

    #[tokio::test]
    async fn test_third_party_message_notifies_owner() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(StubGateway::new(
            r#"[{"_id": 8, "type": "inbox", "number": "98765432", "body": "see you at six"}]"#,
        ));
        let memory = Arc::new(MemoryStore::new(
            dir.path().join("user_profile.json"),
            "+4712345678",
        ));
        memory.upsert_contact(pocketbot_memory::ContactUpdate {
            number: "98765432".into(),
            name: "Kari".into(),
            relationship: "boss".into(),
            ..Default::default()
        });
        let channel = SmsChannel::new(
            gateway.clone(),
            StateStore::new(dir.path().join("state.json")),
            memory,
            "+4712345678",
        );

        assert_eq!(channel.poll().await, None);

        let commands = gateway.commands();
        let notify = commands.iter().find(|c| c.contains("termux-sms-send")).unwrap();
        assert!(notify.contains("-n +4712345678"));
        assert!(notify.contains("New SMS from Kari (boss): see you at six"));
    }

    #[tokio::test]
    async fn test_long_third_party_message_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let long_body = "x".repeat(130);
        let gateway = Arc::new(StubGateway::new(&format!(
            r#"[{{"_id": 8, "type": "inbox", "number": "11112222", "body": "{long_body}"}}]"#
        )));
        let channel = channel_with(&dir, gateway.clone());

        channel.poll().await;
        let commands = gateway.commands();
        let notify = commands.iter().find(|c| c.contains("termux-sms-send")).unwrap();
        assert!(notify.contains(&format!("{}...", "x".repeat(100))));
        assert!(!notify.contains(&"x".repeat(101)));
    }
}
