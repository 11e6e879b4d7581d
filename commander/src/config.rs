//! Configuration file handling.
//!
//! The configuration is a small JSON document; every field is optional and
//! falls back to its default:
//!
//! ```json
//! {
//!   "prefix": "!",
//!   "direct_messages": true,
//!   "console": { "bot_name": "commander", "user": "you", "channel": "console", "prompt": "> " }
//! }
//! ```

use crate::checks;
use crate::commander::Commander;
use crate::error::{ConfigError, ConfigResult, Result};
use crate::platforms::ConsoleConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Commander settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderConfig {
    /// Command prefix; `None` disables prefix addressing.
    pub prefix: Option<String>,
    /// Treat every direct message as a command.
    pub direct_messages: bool,
    /// Console platform settings.
    pub console: ConsoleConfig,
}

impl Default for CommanderConfig {
    fn default() -> Self {
        Self {
            prefix: Some("!".to_string()),
            direct_messages: true,
            console: ConsoleConfig::default(),
        }
    }
}

/// Severity of a [`ConfigIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    /// Works, but probably not as intended.
    Warning,
    /// Cannot be used.
    Error,
}

/// A problem found by [`CommanderConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Severity.
    pub level: IssueLevel,
    /// Human-readable description.
    pub message: String,
}

impl ConfigIssue {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            IssueLevel::Warning => "warning",
            IssueLevel::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}

impl CommanderConfig {
    /// Check the configuration for problems.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        match self.prefix.as_deref() {
            Some(prefix) if prefix.trim().is_empty() => {
                issues.push(ConfigIssue::error(
                    "prefix is empty; every message would be a command",
                ));
            }
            None if !self.direct_messages => {
                issues.push(ConfigIssue::warning(
                    "no prefix and direct messages disabled; only mentions address the bot",
                ));
            }
            _ => {}
        }

        if self.console.user.trim().is_empty() {
            issues.push(ConfigIssue::error("console.user is empty"));
        }
        if self.console.bot_name == self.console.user {
            issues.push(ConfigIssue::warning(
                "console.bot_name equals console.user",
            ));
        }

        issues
    }

    /// Whether [`validate`](Self::validate) reports any error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|issue| issue.level == IssueLevel::Error)
    }

    /// Register the address checks this configuration enables.
    ///
    /// # Errors
    ///
    /// Fails if the commander is already connected.
    pub fn install_checks(&self, commander: &mut Commander) -> Result<()> {
        if let Some(prefix) = &self.prefix {
            commander.add_command_check(checks::prefix(prefix.clone()))?;
        }
        if self.direct_messages {
            commander.add_command_check(checks::direct_messages())?;
        }
        Ok(())
    }
}

/// Default configuration file location.
#[must_use]
pub fn config_path() -> PathBuf {
    dirs_next::config_dir()
        .or_else(dirs_next::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("commander")
        .join("config.json")
}

/// Load the configuration at `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not valid JSON.
pub async fn load_config(path: &Path) -> ConfigResult<CommanderConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Write `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Fails if the configuration has errors or the file cannot be written.
pub async fn save_config(path: &Path, config: &CommanderConfig) -> ConfigResult<()> {
    if let Some(issue) = config
        .validate()
        .into_iter()
        .find(|issue| issue.level == IssueLevel::Error)
    {
        return Err(ConfigError::invalid(issue.message));
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}
