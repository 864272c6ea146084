use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FolioError, Result};
use crate::types::Mode;

/// Top-level configuration for Folio.
///
/// Loaded from `~/.folio/config.toml` by default. Every section falls back to
/// its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FolioConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FolioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the durable key/value store.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.folio/data".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Chat widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Mode preselected for new sessions. `None` asks the visitor.
    pub default_mode: Option<Mode>,
    /// Optional TOML file replacing the built-in conversation chains.
    pub chains_path: Option<String>,
    /// Optional text file replacing the built-in knowledge base.
    pub knowledge_path: Option<String>,
    /// Number of prior messages sent with each completion request.
    pub history_turns: usize,
    /// Longest accepted message, in characters.
    pub max_message_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_mode: None,
            chains_path: None,
            knowledge_path: None,
            history_turns: 6,
            max_message_chars: 2000,
        }
    }
}

/// Completion provider settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://openrouter.ai/api/v1".to_string(),
            model: "meta-llama/llama-3.3-70b-instruct".to_string(),
            max_tokens: 400,
            temperature: 0.7,
            api_key_env: "FOLIO_LLM_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client-side sliding-window throttle for outgoing chat messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sends allowed inside one window.
    pub max_requests: usize,
    /// Window length in seconds.
    pub window_secs: u64,
    /// Storage key holding the JSON array of send timestamps.
    pub storage_key: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 120,
            storage_key: "folio.chat.rate_limit".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_default_values() {
        let config = FolioConfig::default();

        assert_eq!(config.general.data_dir, "~/.folio/data");
        assert_eq!(config.general.log_level, "warn");

        assert_eq!(config.chat.default_mode, None);
        assert!(config.chat.chains_path.is_none());
        assert_eq!(config.chat.history_turns, 6);
        assert_eq!(config.chat.max_message_chars, 2000);

        assert_eq!(config.llm.api_key_env, "FOLIO_LLM_API_KEY");
        assert_eq!(config.llm.max_tokens, 400);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);

        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 120);
        assert_eq!(config.rate_limit.storage_key, "folio.chat.rate_limit");
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
[general]
data_dir = "/tmp/folio"
log_level = "debug"

[chat]
default_mode = "technical"
history_turns = 4

[llm]
api_base = "http://localhost:8080/v1"
model = "local-model"
temperature = 0.2

[rate_limit]
max_requests = 10
window_secs = 60
"#,
        );

        let config = FolioConfig::load(file.path()).unwrap();
        assert_eq!(config.general.data_dir, "/tmp/folio");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.chat.default_mode, Some(Mode::Technical));
        assert_eq!(config.chat.history_turns, 4);
        assert_eq!(config.chat.max_message_chars, 2000);
        assert_eq!(config.llm.api_base, "http://localhost:8080/v1");
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.llm.max_tokens, 400);
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.storage_key, "folio.chat.rate_limit");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = FolioConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.rate_limit.max_requests, 5);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let file = create_temp_config("[chat\nhistory_turns = ");
        let err = FolioConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn test_config_load_or_default_missing_file() {
        let config = FolioConfig::load_or_default(Path::new("/does/not/exist/config.toml"));
        assert_eq!(config.general.data_dir, "~/.folio/data");
        assert_eq!(config.chat.history_turns, 6);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = FolioConfig::default();
        config.chat.default_mode = Some(Mode::Basic);
        config.llm.model = "another-model".to_string();
        config.save(&path).unwrap();

        let loaded = FolioConfig::load(&path).unwrap();
        assert_eq!(loaded.chat.default_mode, Some(Mode::Basic));
        assert_eq!(loaded.llm.model, "another-model");
    }
}
