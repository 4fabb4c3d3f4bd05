//! Interactive onboarding: owner number, LLM transport, a device permission
//! probe, and an optional memory profile interview.

use std::io::Write;

use chrono::Utc;
use pocketbot_config::{BotConfig, LlmMode};
use pocketbot_memory::{MemoryNote, MemoryStore};
use pocketbot_store::DataDir;

pub fn run_onboarding() -> anyhow::Result<()> {
    let mut config = pocketbot_config::load_config()?;
    println!("Starting onboarding...");

    if let Some(number) = prompt_text("Phone number the agent should use", &config.user.phone_number)? {
        config.user.phone_number = number;
    }

    let current_mode = match config.llm.mode {
        LlmMode::Http => "http",
        LlmMode::Pubsub => "pubsub",
    };
    config.llm.mode = match prompt_choice("Choose LLM transport", &["http", "pubsub"], current_mode)?.as_str() {
        "pubsub" => LlmMode::Pubsub,
        _ => LlmMode::Http,
    };

    match config.llm.mode {
        LlmMode::Http => {
            if let Some(url) = prompt_text("HTTP server URL", &config.llm.http.server_url)? {
                config.llm.http.server_url = url;
            }
            if let Some(model) = prompt_text("Model name", &config.llm.http.model)? {
                config.llm.http.model = model;
            }
        }
        LlmMode::Pubsub => {
            if let Some(url) = prompt_text("Broker URL", &config.llm.pubsub.broker_url)? {
                config.llm.pubsub.broker_url = url;
            }
            if let Some(topic) = prompt_text("Request topic", &config.llm.pubsub.request_topic)? {
                config.llm.pubsub.request_topic = topic;
            }
            if let Some(timeout) = prompt_text("Reply timeout (seconds)", &config.llm.pubsub.timeout_secs.to_string())? {
                if let Ok(secs) = timeout.parse() {
                    config.llm.pubsub.timeout_secs = secs;
                }
            }
        }
    }

    if prompt_choice("Run the device permission probe", &["yes", "no"], "yes")? == "yes" {
        println!("Permission probe:");
        for (name, ok, detail) in check_device_permissions(&config) {
            let status = if ok { "OK" } else { "FAILED" };
            println!("- {name}: {status} ({detail})");
        }
    }

    if prompt_choice("Answer the profile questions", &["yes", "no"], "yes")? == "yes" {
        fill_profile(&config)?;
    }

    config.onboarding.completed = true;
    pocketbot_config::save_config(&config)?;
    println!("Onboarding complete.");
    Ok(())
}

/// Verify the agent can write its own data files and the shared storage
/// directory Termux exposes.
fn check_device_permissions(config: &BotConfig) -> Vec<(&'static str, bool, String)> {
    let mut results = Vec::new();

    match config.data_dir() {
        Ok(data_dir) => {
            let probe = data_dir.join("permission_test.json");
            let attempt = std::fs::create_dir_all(&data_dir)
                .and_then(|_| std::fs::write(&probe, format!("{{\"timestamp\":\"{}\"}}", Utc::now())))
                .and_then(|_| std::fs::remove_file(&probe));
            match attempt {
                Ok(()) => results.push(("Write data file", true, format!("OK: {}", data_dir.display()))),
                Err(e) => results.push(("Write data file", false, format!("Error: {e}"))),
            }
        }
        Err(e) => results.push(("Write data file", false, format!("Error: {e}"))),
    }

    let home = std::env::var("HOME").unwrap_or_default();
    let storage = std::path::Path::new(&home).join("storage/downloads");
    if !storage.exists() {
        results.push((
            "Shared storage",
            false,
            "~/storage/downloads not found. Run termux-setup-storage.".to_string(),
        ));
    } else {
        let probe = storage.join("permission_test.txt");
        let attempt = std::fs::write(&probe, "pocketbot permission test")
            .and_then(|_| std::fs::remove_file(&probe));
        match attempt {
            Ok(()) => results.push(("Write shared storage", true, format!("OK: {}", storage.display()))),
            Err(e) => results.push(("Write shared storage", false, format!("Error: {e}"))),
        }
    }

    results
}

fn fill_profile(config: &BotConfig) -> anyhow::Result<()> {
    let data_dir = DataDir::new(config.data_dir()?);
    std::fs::create_dir_all(data_dir.root())?;
    let store = MemoryStore::new(data_dir.memory_file(), config.user.phone_number.clone());
    let mut memory = store.load();

    if let Some(name) = prompt_text("What is your name?", &memory.profile.name)? {
        memory.profile.name = name;
    }
    let age = memory.profile.age.map(|a| a.to_string()).unwrap_or_default();
    if let Some(age) = prompt_text("How old are you?", &age)? {
        if let Ok(age) = age.parse() {
            memory.profile.age = Some(age);
        }
    }
    if let Some(bio) = prompt_text("Short bio", &memory.profile.bio)? {
        memory.profile.bio = bio;
    }
    if let Some(locale) = prompt_text("Language/locale", &memory.profile.locale)? {
        memory.profile.locale = locale;
    }
    if let Some(tone) = prompt_text("Preferred tone", &memory.preferences.tone)? {
        memory.preferences.tone = tone;
    }
    if let Some(style) = prompt_text("Response style", &memory.preferences.response_style)? {
        memory.preferences.response_style = style;
    }
    if let Some(interests) = prompt_text("Interests (comma-separated)", &memory.interests.join(", "))? {
        memory.interests = interests
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
    }
    if let Some(note) = prompt_text("Extra note (optional)", "")? {
        memory.notes.push(MemoryNote {
            note,
            timestamp: Utc::now(),
        });
    }

    store.save(&memory);
    Ok(())
}

/// Prompt for free text. Returns `None` when the user keeps the default.
fn prompt_text(prompt: &str, default: &str) -> anyhow::Result<Option<String>> {
    if default.is_empty() {
        print!("{prompt}: ");
    } else {
        print!("{prompt} [{default}]: ");
    }
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line.to_string()))
    }
}

/// Prompt for one of a fixed set of options, re-asking until valid.
fn prompt_choice(prompt: &str, options: &[&str], default: &str) -> anyhow::Result<String> {
    loop {
        print!("{prompt} ({}) [{default}]: ", options.join("/"));
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        let line = line.trim().to_lowercase();
        if line.is_empty() {
            return Ok(default.to_string());
        }
        if options.contains(&line.as_str()) {
            return Ok(line);
        }
        println!("Invalid choice. Try again.");
    }
}
