//! Verdant configuration.
//!
//! Config file: ~/.config/verdant/config.toml (or $XDG_CONFIG_HOME).
//! Every field has a default, so a partial file is fine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// XP awarded for individual actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XpConfig {
    pub task_completed: u64,
    pub habit_check_in: u64,
    pub journal_entry: u64,
    pub book_finished: u64,
    pub focus_session: u64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            task_completed: 10,
            habit_check_in: 5,
            journal_entry: 15,
            book_finished: 50,
            focus_session: 20,
        }
    }
}

/// Reward presentation timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// How long an achievement toast stays up
    pub toast_dwell_secs: u64,
    /// Badge dialogs wait for explicit dismissal
    pub badge_dialog_manual: bool,
    /// Delay between an action and its XP notice
    pub xp_notice_delay_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            toast_dwell_secs: 5,
            badge_dialog_manual: true,
            xp_notice_delay_ms: 600,
        }
    }
}

impl NotificationConfig {
    pub fn toast_dwell(&self) -> Duration {
        Duration::from_secs(self.toast_dwell_secs)
    }
}

/// Where state lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub state_path: Option<PathBuf>,
}

/// Main Verdant configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdantConfig {
    #[serde(default)]
    pub xp: XpConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl VerdantConfig {
    /// Default user config path: ~/.config/verdant/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(config_dir.join("verdant").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config (~/.config/verdant/config.toml)
    /// 3. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Effective state file path
    pub fn state_path(&self) -> PathBuf {
        self.storage
            .state_path
            .clone()
            .unwrap_or_else(crate::persist::StateStore::default_path)
    }
}
