use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::theme::DreamTheme;

/// Extension settings, one key per host config entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DreamConfig {
    /// Master switch for the command
    pub enabled: bool,

    /// Trigger mode; anything containing `daily_auto` starts the daily timer
    pub trigger_mode: String,

    /// Daily trigger time of day, "HH:MM"
    pub auto_trigger_time: String,

    /// Free-text style handed to the provider
    pub dream_style: String,

    /// Theme id for the rendered card
    pub dream_theme: String,

    pub min_messages_for_dream: usize,

    pub max_history_messages: usize,

    /// Endpoint the standalone binary talks to
    pub provider: ProviderConfig,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_env: Option<String>,
}

impl Default for DreamConfig {
    fn default() -> Self {
        DreamConfig {
            enabled: true,
            trigger_mode: "command_only".to_string(),
            auto_trigger_time: "23:59".to_string(),
            dream_style: "一段融合了赛博朋克与古典悲剧元素的意识流独白".to_string(),
            dream_theme: DreamTheme::MidnightGothic.id().to_string(),
            min_messages_for_dream: 20,
            max_history_messages: 300,
            provider: ProviderConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            name: "OpenRouter".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: Some("OPENROUTER_API_KEY".to_string()),
        }
    }
}

impl DreamConfig {
    /// Default location: `~/.dreamweaver/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".dreamweaver").join("config.toml"))
    }

    /// Load from `path`. Missing keys take their defaults; when any were
    /// missing the completed file is written back. A file that already has
    /// every key is left untouched, comments included.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = DreamConfig::default();
            config.save_to(path)?;
            info!("Wrote default dream config to {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: DreamConfig =
            toml::from_str(&content).context("Failed to parse config file")?;

        let present: toml::Table = content.parse().context("Failed to parse config file")?;
        let complete = toml::Value::try_from(&config).context("Failed to serialize config")?;
        if let Some(complete) = complete.as_table() {
            if has_missing_keys(&present, complete) {
                config.save_to(path)?;
                info!("Filled missing keys in {}", path.display());
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn is_daily_auto(&self) -> bool {
        self.trigger_mode.contains("daily_auto")
    }

    pub fn theme(&self) -> DreamTheme {
        DreamTheme::resolve(&self.dream_theme)
    }
}

/// Whether `complete` has a key, at any depth, that `present` lacks
fn has_missing_keys(present: &toml::Table, complete: &toml::Table) -> bool {
    complete
        .iter()
        .any(|(key, value)| match (present.get(key), value) {
            (None, _) => true,
            (Some(toml::Value::Table(present)), toml::Value::Table(complete)) => {
                has_missing_keys(present, complete)
            }
            _ => false,
        })
}

impl ProviderConfig {
    /// API key from config or environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key.clone().or_else(|| {
            self.api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
        })
    }
}
