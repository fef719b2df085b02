//! Configuration for musing
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! ```toml
//! [telegram]
//! token = "123456:ABC..."
//! poll_timeout_secs = 30
//!
//! [storage]
//! database_path = "thoughts.db"
//!
//! [flow]
//! page_size = 5
//! top_tags = 7
//! session_idle_minutes = 60
//! ```
//!
//! | variable | overrides |
//! |---|---|
//! | `MUSING_TOKEN`, then `TOKEN` | `telegram.token` |
//! | `MUSING_DATABASE` | `storage.database_path` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pager::DEFAULT_PAGE_SIZE;
use crate::ranker::DEFAULT_TOP_TAGS;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "MUSING_CONFIG";

/// System-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MusingConfig {
    pub telegram: TelegramConfig,
    pub storage: StorageConfig,
    pub flow: FlowConfig,
}

/// Bot API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token; usually supplied through the environment
    pub token: Option<String>,
    /// API base URL
    pub api_url: String,
    /// Long-poll timeout for getUpdates
    pub poll_timeout_secs: u64,
    /// Pause after a failed poll before retrying
    pub retry_delay_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            retry_delay_secs: 5,
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("thoughts.db"),
        }
    }
}

/// Conversation flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Thoughts per list page
    pub page_size: usize,
    /// Tags offered in the picker
    pub top_tags: usize,
    /// Reset abandoned flows after this many idle minutes (0 disables)
    pub session_idle_minutes: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            top_tags: DEFAULT_TOP_TAGS,
            session_idle_minutes: 60,
        }
    }
}

impl FlowConfig {
    /// Idle timeout, `None` when disabled
    pub fn idle_timeout(&self) -> Option<chrono::Duration> {
        match self.session_idle_minutes {
            0 => None,
            minutes => Some(chrono::Duration::minutes(i64::from(minutes))),
        }
    }
}

impl MusingConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Default config file location (`<config dir>/musing/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("musing").join("config.toml"))
    }

    /// Load from `MUSING_CONFIG` or the default location, falling back to
    /// defaults when no file exists, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {:?}", path);
                Self::from_file(&path)?
            }
            _ => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let token = lookup("MUSING_TOKEN")
            .or_else(|| lookup("TOKEN"))
            .filter(|t| !t.trim().is_empty());
        if let Some(token) = token {
            self.telegram.token = Some(token);
        }

        if let Some(path) = lookup("MUSING_DATABASE").filter(|p| !p.trim().is_empty()) {
            self.storage.database_path = PathBuf::from(path);
        }
    }

    /// The bot token, required to start
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.telegram
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}
