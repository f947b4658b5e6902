//! Service settings loading from config.toml
//!
//! This module provides functionality to load runtime settings from a TOML
//! configuration file. Every field has a default, so a missing config.toml is
//! not an error; the service runs with the defaults below. The sweep cadence
//! is a deployment tuning parameter, not a correctness parameter - any sub-5
//! second interval is consistent with the 15-second default delay window.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Lifecycle and sweep tuning
    #[serde(default)]
    pub service: ServiceSettings,
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Lifecycle and sweep tuning knobs
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceSettings {
    /// Delay window applied to new items that don't specify their own, in seconds
    #[serde(default = "default_delay_seconds")]
    pub default_delay_seconds: i32,
    /// How often the expiry sweep runs, in seconds
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    /// When true, completing an order is rejected while it still has
    /// draft or pending items. The reference behavior is false: a check may
    /// be closed with un-fired items and the decision is left to the caller.
    #[serde(default)]
    pub close_requires_all_fired: bool,
}

/// Database connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// SQLite connection URL; overridden by the `DATABASE_URL` environment variable
    #[serde(default = "default_database_url")]
    pub url: String,
}

const fn default_delay_seconds() -> i32 {
    15
}

const fn default_sweep_interval_seconds() -> u64 {
    2
}

fn default_database_url() -> String {
    "sqlite://data/fireline.sqlite?mode=rwc".to_string()
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            default_delay_seconds: default_delay_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            close_requires_all_fired: false,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl DatabaseSettings {
    /// The connection URL to use, preferring the `DATABASE_URL` environment
    /// variable over the configured value.
    #[must_use]
    pub fn effective_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.url.clone())
    }
}

/// Loads settings from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file exists but cannot be read, or if the TOML
/// syntax is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from the default location (./config.toml), falling back to
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    if Path::new("config.toml").exists() {
        load_settings("config.toml")
    } else {
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml_str = r#"
            [service]
            default_delay_seconds = 30
            sweep_interval_seconds = 1
            close_requires_all_fired = true

            [database]
            url = "sqlite::memory:"
        "#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.service.default_delay_seconds, 30);
        assert_eq!(settings.service.sweep_interval_seconds, 1);
        assert!(settings.service.close_requires_all_fired);
        assert_eq!(settings.database.url, "sqlite::memory:");
    }

    #[test]
    fn test_defaults_applied_for_missing_fields() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.service.default_delay_seconds, 15);
        assert_eq!(settings.service.sweep_interval_seconds, 2);
        assert!(!settings.service.close_requires_all_fired);
        assert!(settings.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let toml_str = r"
            [service]
            sweep_interval_seconds = 5
        ";

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.service.sweep_interval_seconds, 5);
        assert_eq!(settings.service.default_delay_seconds, 15);
    }
}
