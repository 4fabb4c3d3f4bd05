//! pocketbot-memory: the persisted memory document and history log.
//!
//! Memory is one JSON document (profile, contacts, preferences, interests,
//! notes, short-term block) read and written whole. The history log is a
//! separate bounded document of role/content/timestamp entries.

pub mod history;
pub mod recall;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notes shown in the prompt context.
const PROMPT_NOTE_COUNT: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en-US".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default = "default_tone")]
    pub tone_preference: String,
    #[serde(default)]
    pub context: String,
}

fn default_tone() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_pref_tone")]
    pub tone: String,
    #[serde(default = "default_response_style")]
    pub response_style: String,
}

fn default_pref_tone() -> String {
    "Helpful, upbeat and a little sarcastic".to_string()
}

fn default_response_style() -> String {
    "short and precise via SMS".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            tone: default_pref_tone(),
            response_style: default_response_style(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryNote {
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortTermMemory {
    #[serde(default)]
    pub current_context: String,
    #[serde(default)]
    pub current_date: String,
    #[serde(default)]
    pub user_location: String,
    #[serde(default)]
    pub user_activity: String,
    #[serde(default)]
    pub today_plans: Vec<String>,
}

impl ShortTermMemory {
    fn is_empty(&self) -> bool {
        self.current_context.is_empty()
            && self.current_date.is_empty()
            && self.user_location.is_empty()
            && self.user_activity.is_empty()
            && self.today_plans.is_empty()
    }
}

/// The whole memory document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDoc {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub notes: Vec<MemoryNote>,
    #[serde(default)]
    pub short_term_memory: ShortTermMemory,
}

impl MemoryDoc {
    /// The default document seeds the owner as the first contact.
    pub fn default_for(owner_number: &str) -> Self {
        Self {
            contacts: vec![Contact {
                name: String::new(),
                number: owner_number.to_string(),
                relationship: "Owner".to_string(),
                tone_preference: default_tone(),
                context: "This is the device owner".to_string(),
            }],
            ..Self::default()
        }
    }
}

/// Fields of `add_or_update_contact`; absent fields leave the stored
/// contact untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub tone_preference: String,
    #[serde(default)]
    pub context: String,
}

/// Fields of `update_short_term_memory`; only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortTermUpdate {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

/// Repository for the memory document.
pub struct MemoryStore {
    path: PathBuf,
    owner_number: String,
}

impl MemoryStore {
    pub fn new(path: PathBuf, owner_number: impl Into<String>) -> Self {
        Self {
            path,
            owner_number: owner_number.into(),
        }
    }

    pub fn load(&self) -> MemoryDoc {
        pocketbot_store::load_json(&self.path, || MemoryDoc::default_for(&self.owner_number))
    }

    pub fn save(&self, doc: &MemoryDoc) {
        if let Err(e) = pocketbot_store::save_json(&self.path, doc) {
            tracing::warn!(path = %self.path.display(), "Failed to persist memory: {e}");
        }
    }

    /// Append a timestamped note. Empty notes are rejected with a message.
    pub fn append_note(&self, note: &str, now: DateTime<Utc>) -> String {
        let note = note.trim();
        if note.is_empty() {
            return "No note provided".to_string();
        }
        let mut doc = self.load();
        doc.notes.push(MemoryNote {
            note: note.to_string(),
            timestamp: now,
        });
        self.save(&doc);
        "Note saved".to_string()
    }

    /// Add a contact or update the one with the same normalized number.
    /// Only provided (non-empty) fields overwrite existing values.
    pub fn upsert_contact(&self, update: ContactUpdate) -> String {
        let number = update.number.trim();
        if number.is_empty() {
            return "Missing phone number".to_string();
        }

        let mut doc = self.load();
        let normalized = normalize_number(number);
        let label = if update.name.is_empty() {
            number.to_string()
        } else {
            update.name.clone()
        };

        if let Some(contact) = doc
            .contacts
            .iter_mut()
            .find(|c| normalize_number(&c.number) == normalized)
        {
            if !update.name.is_empty() {
                contact.name = update.name;
            }
            if !update.relationship.is_empty() {
                contact.relationship = update.relationship;
            }
            if !update.tone_preference.is_empty() {
                contact.tone_preference = update.tone_preference;
            }
            if !update.context.is_empty() {
                contact.context = update.context;
            }
            self.save(&doc);
            return format!("Contact {label} updated");
        }

        doc.contacts.push(Contact {
            name: label.clone(),
            number: number.to_string(),
            relationship: update.relationship,
            tone_preference: if update.tone_preference.is_empty() {
                default_tone()
            } else {
                update.tone_preference
            },
            context: update.context,
        });
        self.save(&doc);
        format!("Contact {label} added")
    }

    /// Apply a short-term memory update. Plans are appended without duplicates.
    pub fn update_short_term(&self, update: ShortTermUpdate) -> String {
        let mut doc = self.load();
        let stm = &mut doc.short_term_memory;
        if let Some(context) = update.context {
            stm.current_context = context;
        }
        if let Some(date) = update.date {
            stm.current_date = date;
        }
        if let Some(location) = update.location {
            stm.user_location = location;
        }
        if let Some(activity) = update.activity {
            stm.user_activity = activity;
        }
        if let Some(plan) = update.plan {
            if !stm.today_plans.contains(&plan) {
                stm.today_plans.push(plan);
            }
        }
        self.save(&doc);
        "Short-term memory updated".to_string()
    }

    /// Find a contact whose number matches (whitespace and "+" insensitive,
    /// substring in either direction to tolerate country prefixes).
    pub fn lookup_contact(&self, number: &str) -> Option<Contact> {
        let wanted = normalize_number(number);
        if wanted.is_empty() {
            return None;
        }
        self.load().contacts.into_iter().find(|c| {
            let stored = normalize_number(&c.number);
            !stored.is_empty() && (wanted.contains(&stored) || stored.contains(&wanted))
        })
    }

    /// Render the memory sections injected into the system context.
    /// Returns an empty string when there is nothing worth injecting.
    pub fn context_for_prompt(&self) -> String {
        let doc = self.load();
        let mut sections = Vec::new();

        if !doc.contacts.is_empty() {
            let lines: Vec<String> = doc
                .contacts
                .iter()
                .map(|c| {
                    let mut line = c.name.clone();
                    if !c.relationship.is_empty() {
                        line.push_str(&format!(" ({})", c.relationship));
                    }
                    if !c.tone_preference.is_empty() && c.tone_preference != "normal" {
                        line.push_str(&format!(" - tone: {}", c.tone_preference));
                    }
                    if !c.context.is_empty() {
                        line.push_str(&format!(" - {}", c.context));
                    }
                    line
                })
                .collect();
            sections.push(format!("CONTACTS:\n{}", lines.join("\n")));
        }

        let stm = &doc.short_term_memory;
        if !stm.is_empty() {
            let mut lines = Vec::new();
            if !stm.current_date.is_empty() {
                lines.push(format!("Date: {}", stm.current_date));
            }
            if !stm.current_context.is_empty() {
                lines.push(format!("Context: {}", stm.current_context));
            }
            if !stm.user_location.is_empty() {
                lines.push(format!("Location: {}", stm.user_location));
            }
            if !stm.user_activity.is_empty() {
                lines.push(format!("Activity: {}", stm.user_activity));
            }
            if !stm.today_plans.is_empty() {
                lines.push(format!("Plans: {}", stm.today_plans.join(", ")));
            }
            if !lines.is_empty() {
                sections.push(format!("SHORT-TERM MEMORY:\n{}", lines.join("\n")));
            }
        }

        if !doc.notes.is_empty() {
            let recent: Vec<&str> = doc
                .notes
                .iter()
                .rev()
                .take(PROMPT_NOTE_COUNT)
                .map(|n| n.note.as_str())
                .collect();
            let ordered: Vec<&str> = recent.into_iter().rev().collect();
            sections.push(format!("IMPORTANT NOTES:\n{}", ordered.join("\n")));
        }

        sections.join("\n\n")
    }
}

/// Strip whitespace and "+" so numbers compare across formatting styles.
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| !c.is_whitespace() && *c != '+').collect()
}
