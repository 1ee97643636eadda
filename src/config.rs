//! Configuration shared by the synchronization primitives.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods
//!    (`with_cancel_poll_interval(..)`)
//! 2. **Environment variables**: `MONITOR_SYNC_*`
//! 3. **Config file**: a TOML file (requires the `config-file` feature)
//! 4. **Defaults**: [`SyncConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `MONITOR_SYNC_CANCEL_POLL_MS` | `u64` | `cancel_poll_interval` |
//! | `MONITOR_SYNC_WARN_EXCESS_RELEASE` | `bool` | `warn_on_excess_release` |

use std::time::Duration;

use thiserror::Error;

/// Environment variable name for the cancellation poll interval in milliseconds.
pub const ENV_CANCEL_POLL_MS: &str = "MONITOR_SYNC_CANCEL_POLL_MS";
/// Environment variable name for the excess-release warning toggle.
pub const ENV_WARN_EXCESS_RELEASE: &str = "MONITOR_SYNC_WARN_EXCESS_RELEASE";

/// Default interval at which blocked waiters re-check their `Cx`.
pub const DEFAULT_CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors raised while loading or validating a [`SyncConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set to an unparseable value.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// What the parser expected.
        expected: &'static str,
        /// The raw value found.
        value: String,
    },

    /// A setting is out of range.
    #[error("invalid setting {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The config file could not be read.
    #[cfg(feature = "config-file")]
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`SyncConfig`].
    #[cfg(feature = "config-file")]
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tuning knobs for [`Barrier`](crate::sync::Barrier) and
/// [`Semaphore`](crate::sync::Semaphore).
///
/// None of these change the primitives' contracts; they control how quickly
/// cancellation is noticed and how loudly misuse is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Upper bound on how long a blocked waiter goes without re-checking its
    /// `Cx`. Must be non-zero.
    pub cancel_poll_interval: Duration,
    /// Log a warning when `Semaphore::release` pushes the available count
    /// above its initial value.
    pub warn_on_excess_release: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cancel_poll_interval: DEFAULT_CANCEL_POLL_INTERVAL,
            warn_on_excess_release: true,
        }
    }
}

impl SyncConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the cancellation poll interval.
    #[must_use]
    pub const fn with_cancel_poll_interval(mut self, interval: Duration) -> Self {
        self.cancel_poll_interval = interval;
        self
    }

    /// Enables or disables the excess-release warning.
    #[must_use]
    pub const fn with_warn_on_excess_release(mut self, enabled: bool) -> Self {
        self.warn_on_excess_release = enabled;
        self
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cancel_poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "cancel_poll_interval",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

/// Apply environment variable overrides to a [`SyncConfig`].
///
/// Only variables that are set in the environment are applied.
pub fn apply_env_overrides(config: &mut SyncConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_CANCEL_POLL_MS) {
        config.cancel_poll_interval = Duration::from_millis(parse_u64(ENV_CANCEL_POLL_MS, &val)?);
    }
    if let Some(val) = read_env(ENV_WARN_EXCESS_RELEASE) {
        config.warn_on_excess_release = parse_bool(ENV_WARN_EXCESS_RELEASE, &val)?;
    }
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_u64(var: &'static str, val: &str) -> Result<u64, ConfigError> {
    val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
        var,
        expected: "unsigned integer",
        value: val.to_string(),
    })
}

fn parse_bool(var: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            expected: "bool (true/false/1/0/yes/no)",
            value: val.to_string(),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable form of [`SyncConfig`].
///
/// ```toml
/// [sync]
/// cancel_poll_ms = 5
/// warn_on_excess_release = false
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct SyncTomlConfig {
    /// Settings under `[sync]`.
    #[serde(default)]
    pub sync: SyncTomlSection,
}

/// The `[sync]` table.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct SyncTomlSection {
    /// Poll interval in milliseconds.
    pub cancel_poll_ms: Option<u64>,
    /// Excess-release warning toggle.
    pub warn_on_excess_release: Option<bool>,
}

#[cfg(feature = "config-file")]
impl SyncConfig {
    /// Parses TOML text and layers it over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: SyncTomlConfig = toml::from_str(text)?;
        let mut config = Self::default();
        if let Some(ms) = parsed.sync.cancel_poll_ms {
            config.cancel_poll_interval = Duration::from_millis(ms);
        }
        if let Some(warn) = parsed.sync.warn_on_excess_release {
            config.warn_on_excess_release = warn;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file, then applies environment overrides on top.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }
}
