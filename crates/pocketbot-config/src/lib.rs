use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// How the LLM endpoint is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    /// Direct synchronous request/response.
    Http,
    /// Publish/subscribe broker with correlation-tagged replies.
    Pubsub,
}

/// HTTP endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Chat-completions URL, e.g. "http://192.168.1.10:8080/v1/chat/completions".
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "qwen2.5".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            model: default_model(),
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Publish/subscribe broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// WebSocket broker URL, e.g. "ws://192.168.1.10:9001".
    #[serde(default = "default_broker_url")]
    pub broker_url: String,
    /// Topic requests are published on.
    #[serde(default = "default_request_topic")]
    pub request_topic: String,
    /// Bounded wait for a correlated reply, in seconds.
    #[serde(default = "default_pubsub_timeout")]
    pub timeout_secs: u64,
}

fn default_broker_url() -> String {
    "ws://127.0.0.1:9001".to_string()
}

fn default_request_topic() -> String {
    "inference/request".to_string()
}

fn default_pubsub_timeout() -> u64 {
    45
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            broker_url: default_broker_url(),
            request_topic: default_request_topic(),
            timeout_secs: default_pubsub_timeout(),
        }
    }
}

/// LLM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_mode")]
    pub mode: LlmMode,
    /// Retry over HTTP when the pub/sub wait expires.
    #[serde(default = "default_true")]
    pub fallback_to_http: bool,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pubsub: PubSubConfig,
}

fn default_mode() -> LlmMode {
    LlmMode::Http
}

fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            fallback_to_http: true,
            http: HttpConfig::default(),
            pubsub: PubSubConfig::default(),
        }
    }
}

/// Owner identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Phone number the agent treats as its owner and default recipient.
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingConfig {
    #[serde(default)]
    pub completed: bool,
}

/// Daemon behaviour knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Seconds between polling ticks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Override for the data directory (defaults to ~/.pocketbot/data).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            data_dir: None,
        }
    }
}

/// Top-level pocketbot configuration.
///
/// Every field carries a serde default, so a partial config file merges
/// cleanly over the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub onboarding: OnboardingConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl BotConfig {
    /// Resolve the data directory, honoring the config override.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.agent.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("data")),
        }
    }
}

/// Resolve the pocketbot config directory (~/.pocketbot/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".pocketbot"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.pocketbot/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration from the default path, falling back to defaults.
pub fn load_config() -> Result<BotConfig, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = config_file_path()?;
    load_config_from(&path)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<BotConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(BotConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: BotConfig = json5::from_str(&content)?;
    Ok(config)
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Save configuration to the default path.
pub fn save_config(config: &BotConfig) -> Result<(), ConfigError> {
    let dir = ensure_config_dir()?;
    let path = dir.join("config.json5");
    save_config_to(config, &path)
}

/// Save configuration to a specific path.
pub fn save_config_to(config: &BotConfig, path: &Path) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| ConfigError::Io(std::io::Error::other(e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BotConfig::default();
        assert_eq!(config.llm.mode, LlmMode::Http);
        assert!(config.llm.fallback_to_http);
        assert_eq!(config.llm.http.timeout_secs, 30);
        assert_eq!(config.llm.pubsub.timeout_secs, 45);
        assert_eq!(config.agent.poll_interval_secs, 5);
        assert!(!config.onboarding.completed);
        assert!(config.user.phone_number.is_empty());
    }

    #[test]
    fn test_json5_partial_merge() {
        // A partial file overrides only the fields it names.
        let json5_str = r#"{
            llm: {
                mode: "pubsub",
                pubsub: { broker_url: "ws://10.0.0.2:9001" },
            },
            user: { phone_number: "+4712345678" },
        }"#;
        let config: BotConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.llm.mode, LlmMode::Pubsub);
        assert_eq!(config.llm.pubsub.broker_url, "ws://10.0.0.2:9001");
        // Untouched sections keep their defaults.
        assert_eq!(config.llm.pubsub.request_topic, "inference/request");
        assert_eq!(config.llm.http.model, "qwen2.5");
        assert_eq!(config.user.phone_number, "+4712345678");
    }

    #[test]
    fn test_roundtrip_via_save_format() {
        let mut config = BotConfig::default();
        config.onboarding.completed = true;
        let text = serde_json::to_string_pretty(&config).unwrap();
        let parsed: BotConfig = json5::from_str(&text).unwrap();
        assert!(parsed.onboarding.completed);
    }
}
