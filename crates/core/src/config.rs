// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch timing configuration
//!
//! Durations are written as humantime strings ("5m", "24h"). A missing
//! file yields the defaults: the due check runs on a minutes-scale
//! cadence, the reminder check on an hours-scale one.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Timing knobs for the two dispatch loops
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Cadence of the due-item check
    #[serde(with = "humantime_serde")]
    pub due_check_interval: Duration,

    /// Cadence of the reminder check
    #[serde(with = "humantime_serde")]
    pub reminder_check_interval: Duration,

    /// How long a sent instance may stay unanswered before reminders start
    #[serde(with = "humantime_serde")]
    pub reminder_threshold: Duration,

    /// Upper bound on a single channel send
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            due_check_interval: Duration::from_secs(5 * 60),
            reminder_check_interval: Duration::from_secs(24 * 60 * 60),
            reminder_threshold: Duration::from_secs(24 * 60 * 60),
            send_timeout: Duration::from_secs(10),
        }
    }
}

impl DispatchConfig {
    /// Parse a TOML fragment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
