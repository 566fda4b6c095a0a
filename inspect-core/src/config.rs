// inspect-core/src/config.rs

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::lookup::{FilterPolicy, FormatVersion};

// ════════════════════════════════════════════════════════════════════
// Settings
// ════════════════════════════════════════════════════════════════════

/// Lookup settings, loaded once from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Claim roles allowed to inspect (any one is enough).
    pub required_roles: Vec<String>,
    /// Per-actor cooldown between lookups; -1 disables it.
    pub cooldown_millis: i64,
    /// Highest page count a lookup may reach.
    pub history_limit_page: u32,
    /// Oldest row shown, in hours.
    pub history_limit_date: f64,
    /// Hide rows made by server operators.
    pub hide_ops: bool,
    /// Colour format of the log source's output.
    pub format: FormatVersion,
    pub retry: RetrySettings,
}

/// What to do while the log source can't hand out a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Fixed wait before the whole request is run again.
    pub delay_millis: u64,
    /// `None` keeps retrying forever.
    pub max_attempts: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            required_roles: vec!["OWNER".to_string()],
            cooldown_millis: 5_000,
            history_limit_page: 10,
            history_limit_date: 72.0,
            hide_ops: true,
            format: FormatVersion::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_millis: 250,
            max_attempts: None,
        }
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_millis)
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).context("Failed to parse settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit_page == 0 {
            bail!("history_limit_page must be at least 1");
        }
        if self.history_limit_date.is_nan() || self.history_limit_date < 0.0 {
            bail!(
                "history_limit_date must be a non-negative number of hours, got {}",
                self.history_limit_date
            );
        }
        if self.cooldown_millis < -1 {
            bail!(
                "cooldown_millis must be -1 (disabled) or positive, got {}",
                self.cooldown_millis
            );
        }
        if self.retry.delay_millis == 0 {
            bail!("retry.delay_millis must be greater than 0");
        }
        if self.retry.max_attempts == Some(0) {
            bail!("retry.max_attempts must be at least 1 when set");
        }
        Ok(())
    }

    pub fn cooldown_enabled(&self) -> bool {
        self.cooldown_millis != -1
    }

    /// Request-time filter built from these settings.
    pub fn filter_policy(&self, operators: HashSet<String>) -> FilterPolicy {
        FilterPolicy {
            max_age_hours: self.history_limit_date,
            excluded_actors: operators,
            exclusion_enabled: self.hide_ops,
        }
    }
}
