//! Configuration management for the rotation engine and CLI

use crate::{Result, RotationError};
use boardctrl_core::{ApiConfig, LoggingConfig, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for boardctrl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardCtrlConfig {
    /// Signage backend
    #[serde(default)]
    pub api: ApiConfig,

    /// Credential persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Rotation timing and failure policy
    #[serde(default)]
    pub rotation: RotationConfig,

    /// Display surface selection
    #[serde(default)]
    pub display: DisplayConfig,

    /// Transient notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rotation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Length of one slide duration unit in milliseconds (a minute by default)
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,

    /// Delay before redirecting to login after the session expired, in seconds
    #[serde(default = "default_auth_redirect_delay")]
    pub auth_redirect_delay_seconds: u64,

    /// What to do when navigating to a slide fails mid-rotation
    #[serde(default)]
    pub on_playback_failure: PlaybackFailurePolicy,
}

/// Behaviour when a slide cannot be put on screen during rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackFailurePolicy {
    /// Log, notify, and move on at the next scheduled tick
    #[default]
    Continue,
    /// End the session
    Abort,
}

/// Display sink selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Log navigations only
    #[default]
    Log,
    /// Write the current URL to a file followed by the kiosk browser
    File,
}

/// Display surface configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Sink to drive
    #[serde(default)]
    pub sink: SinkKind,

    /// Target file for the `file` sink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Seconds a notification stays visible (3 to 5)
    #[serde(default = "default_dismiss_after")]
    pub dismiss_after_seconds: u64,

    /// Subscriber channel capacity
    #[serde(default = "default_notification_capacity")]
    pub capacity: usize,
}

const fn default_time_unit_ms() -> u64 {
    60_000
}

const fn default_auth_redirect_delay() -> u64 {
    5
}

const fn default_dismiss_after() -> u64 {
    5
}

const fn default_notification_capacity() -> usize {
    32
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: default_time_unit_ms(),
            auth_redirect_delay_seconds: default_auth_redirect_delay(),
            on_playback_failure: PlaybackFailurePolicy::default(),
        }
    }
}

impl RotationConfig {
    /// Get the duration unit as Duration, never zero
    #[must_use]
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms.max(1))
    }

    /// Get the login redirect delay as Duration
    #[must_use]
    pub const fn auth_redirect_delay(&self) -> Duration {
        Duration::from_secs(self.auth_redirect_delay_seconds)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_seconds: default_dismiss_after(),
            capacity: default_notification_capacity(),
        }
    }
}

impl NotificationConfig {
    /// Visibility window, clamped to 3..=5 seconds
    #[must_use]
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_secs(self.dismiss_after_seconds.clamp(3, 5))
    }
}

impl BoardCtrlConfig {
    /// Load configuration from `config.toml`, `boardctrl.toml` and `BOARDCTRL__*`
    /// environment variables, later sources overriding earlier ones
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Configuration`] if a source cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name("boardctrl").required(false))
            .add_source(config::Environment::with_prefix("BOARDCTRL").separator("__"))
            .build()
            .map_err(|e| RotationError::configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| RotationError::configuration(e.to_string()))
    }

    /// Load configuration from an explicit TOML file
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Configuration`] if the file cannot be read or parsed.
    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RotationError::configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&content)
            .map_err(|e| RotationError::configuration(format!("Failed to parse config file: {e}")))
    }

    /// Render the resolved configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Configuration`] if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| {
            RotationError::configuration(format!("Failed to serialize configuration: {e}"))
        })
    }
}
