//! Configuration management for Underquoted
//!
//! Settings come from a TOML file and can be overridden (or supplied
//! entirely) through environment variables:
//!
//! | Variable                 | Setting               |
//! |--------------------------|-----------------------|
//! | `QUOTATION_URL`          | `quotations.url`      |
//! | `MASTODON_INSTANCE`      | `mastodon.instance`   |
//! | `MASTODON_TOKEN_FILE`    | `mastodon.token_file` |
//! | `MASTODON_ACCESS_TOKEN`  | access token (never read from the file) |
//! | `UNDERQUOTED_CURSOR_DB`  | `cursor.path`         |

use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quotations: QuotationsConfig,
    #[serde(default)]
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotationsConfig {
    /// Service URL; tags are appended as `&search=<tag>`
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MastodonConfig {
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(skip)]
    pub access_token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CursorConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Fragment budget; the platform's character limit when unset
    #[serde(default)]
    pub message_length: Option<usize>,
    #[serde(default = "default_mention_batch")]
    pub mention_batch: usize,
    /// Attempt index that falls back to the "not found" message
    #[serde(default = "default_max_duplicate_retries")]
    pub max_duplicate_retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_mention_batch() -> usize {
    200
}

fn default_max_duplicate_retries() -> u32 {
    10
}

impl Default for QuotationsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/underquoted/cursor.db".to_string(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            message_length: None,
            mention_batch: default_mention_batch(),
            max_duplicate_retries: default_max_duplicate_retries(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error as long as the environment supplies
    /// every required setting.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Self::from_env()
        }
    }

    /// Load configuration from `path`, apply environment overrides and validate
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Configuration from environment variables alone
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("QUOTATION_URL") {
            self.quotations.url = url;
        }
        if let Some(instance) = get("MASTODON_INSTANCE") {
            self.mastodon.instance = instance;
        }
        if let Some(token_file) = get("MASTODON_TOKEN_FILE") {
            self.mastodon.token_file = Some(token_file);
        }
        if let Some(token) = get("MASTODON_ACCESS_TOKEN") {
            self.mastodon.access_token = Some(SecretString::from(token));
        }
        if let Some(path) = get("UNDERQUOTED_CURSOR_DB") {
            self.cursor.path = path;
        }
    }

    /// Check that every required setting is present
    pub fn validate(&self) -> Result<()> {
        if self.quotations.url.trim().is_empty() {
            return Err(missing("quotations.url (or QUOTATION_URL)"));
        }
        if self.mastodon.instance.trim().is_empty() {
            return Err(missing("mastodon.instance (or MASTODON_INSTANCE)"));
        }
        let has_token_file = self
            .mastodon
            .token_file
            .as_deref()
            .is_some_and(|f| !f.trim().is_empty());
        if self.mastodon.access_token.is_none() && !has_token_file {
            return Err(missing("mastodon.token_file (or MASTODON_ACCESS_TOKEN)"));
        }
        if self.cursor.path.trim().is_empty() {
            return Err(missing("cursor.path (or UNDERQUOTED_CURSOR_DB)"));
        }
        Ok(())
    }

    /// Fragment budget given the platform's character limit
    pub fn message_length(&self, platform_limit: usize) -> usize {
        self.bot.message_length.unwrap_or(platform_limit)
    }
}

fn missing(field: &str) -> crate::error::UnderquotedError {
    ConfigError::MissingField(field.to_string()).into()
}

/// Resolve the configuration file path following the XDG base directory layout
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("UNDERQUOTED_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("underquoted").join("config.toml"))
}
