//! Configuration loading, validation, and management for HyperMind.
//!
//! Loads configuration from `~/.hypermind/config.toml` with environment
//! variable overrides. Every field has a default, and the defaults match the
//! store's built-in thresholds, so an absent file is a valid configuration.

use hypermind_core::Tier;
use hypermind_core::event::MAX_EVENT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hypermind/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperMindConfig {
    /// Tier placement
    #[serde(default)]
    pub tiers: TierConfig,

    /// Promotion, demotion and deduplication thresholds
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Domain event bus
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier used by `store` when the caller names none
    #[serde(default)]
    pub default_tier: Tier,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            default_tier: Tier::Hot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Hot entries older than this are candidates for demotion
    #[serde(default = "default_demote_after_hours")]
    pub demote_after_hours: u64,

    /// Only candidates accessed fewer times than this are demoted
    #[serde(default = "default_demote_below_accesses")]
    pub demote_below_accesses: u32,

    /// Retrieval promotes an entry once its access count exceeds this
    #[serde(default = "default_promote_above_accesses")]
    pub promote_above_accesses: u32,

    /// Run a maintenance pass after every store
    #[serde(default = "default_true")]
    pub maintain_on_store: bool,
}

fn default_demote_after_hours() -> u64 {
    24
}
fn default_demote_below_accesses() -> u32 {
    5
}
fn default_promote_above_accesses() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            demote_after_hours: default_demote_after_hours(),
            demote_below_accesses: default_demote_below_accesses(),
            promote_above_accesses: default_promote_above_accesses(),
            maintain_on_store: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast buffer size; slow subscribers lag past this many events
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

impl HyperMindConfig {
    /// Load configuration from the default path (~/.hypermind/config.toml).
    ///
    /// Environment variables override file values:
    /// - `HYPERMIND_DEFAULT_TIER`
    /// - `HYPERMIND_DEMOTE_AFTER_HOURS`
    /// - `HYPERMIND_PROMOTE_ABOVE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded HyperMind configuration");
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hypermind")
    }

    /// Apply overrides looked up through `lookup` (normally `std::env::var`).
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tier) = lookup("HYPERMIND_DEFAULT_TIER") {
            self.tiers.default_tier = tier
                .parse()
                .map_err(|e: String| ConfigError::ValidationError(format!("HYPERMIND_DEFAULT_TIER: {e}")))?;
        }

        if let Some(hours) = lookup("HYPERMIND_DEMOTE_AFTER_HOURS") {
            self.maintenance.demote_after_hours = hours.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "HYPERMIND_DEMOTE_AFTER_HOURS must be a whole number of hours, got '{hours}'"
                ))
            })?;
        }

        if let Some(threshold) = lookup("HYPERMIND_PROMOTE_ABOVE") {
            self.maintenance.promote_above_accesses = threshold.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "HYPERMIND_PROMOTE_ABOVE must be a non-negative integer, got '{threshold}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.maintenance.demote_after_hours == 0 {
            return Err(ConfigError::ValidationError(
                "maintenance.demote_after_hours must be > 0".into(),
            ));
        }

        if self.maintenance.demote_below_accesses > self.maintenance.promote_above_accesses {
            return Err(ConfigError::ValidationError(
                "maintenance.demote_below_accesses must not exceed promote_above_accesses".into(),
            ));
        }

        if self.events.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "events.capacity must be > 0".into(),
            ));
        }

        if self.events.capacity > MAX_EVENT_CAPACITY {
            return Err(ConfigError::ValidationError(format!(
                "events.capacity must be at most {MAX_EVENT_CAPACITY}, got {}",
                self.events.capacity
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl From<ConfigError> for hypermind_core::Error {
    fn from(err: ConfigError) -> Self {
        hypermind_core::Error::Config {
            message: err.to_string(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = HyperMindConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiers.default_tier, Tier::Hot);
        assert_eq!(config.maintenance.demote_after_hours, 24);
        assert_eq!(config.maintenance.demote_below_accesses, 5);
        assert_eq!(config.maintenance.promote_above_accesses, 10);
        assert!(config.maintenance.maintain_on_store);
        assert_eq!(config.events.capacity, 256);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = HyperMindConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: HyperMindConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[tiers]
default_tier = "warm"

[maintenance]
promote_above_accesses = 3
demote_below_accesses = 2
"#;
        let config: HyperMindConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.tiers.default_tier, Tier::Warm);
        assert_eq!(config.maintenance.promote_above_accesses, 3);
        assert_eq!(config.maintenance.demote_after_hours, 24);
        assert_eq!(config.events.capacity, 256);
    }

    #[test]
    fn zero_demotion_age_rejected() {
        let mut config = HyperMindConfig::default();
        config.maintenance.demote_after_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlapping_thresholds_rejected() {
        let mut config = HyperMindConfig::default();
        config.maintenance.demote_below_accesses = 20;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn zero_event_capacity_rejected() {
        let mut config = HyperMindConfig::default();
        config.events.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_event_capacity_rejected() {
        let mut config = HyperMindConfig::default();
        config.events.capacity = MAX_EVENT_CAPACITY;
        assert!(config.validate().is_ok());
        config.events.capacity = MAX_EVENT_CAPACITY + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_event_capacity_in_file_is_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[events]\ncapacity = 9223372036854775807").unwrap();

        let err = HyperMindConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = HyperMindConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(result.unwrap(), HyperMindConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[events]\ncapacity = 8\n[tiers]\ndefault_tier = \"cold\"").unwrap();

        let config = HyperMindConfig::load_from(file.path()).unwrap();
        assert_eq!(config.events.capacity, 8);
        assert_eq!(config.tiers.default_tier, Tier::Cold);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tiers]\ndefault_tier = \"tepid\"").unwrap();

        let err = HyperMindConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_is_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[maintenance]\ndemote_after_hours = 0").unwrap();

        let err = HyperMindConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("HYPERMIND_DEFAULT_TIER", "archived"),
            ("HYPERMIND_DEMOTE_AFTER_HOURS", "48"),
            ("HYPERMIND_PROMOTE_ABOVE", "20"),
        ]);
        let mut config = HyperMindConfig::default();
        config
            .apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.tiers.default_tier, Tier::Archived);
        assert_eq!(config.maintenance.demote_after_hours, 48);
        assert_eq!(config.maintenance.promote_above_accesses, 20);
    }

    #[test]
    fn bad_env_override_rejected() {
        let mut config = HyperMindConfig::default();
        let err = config
            .apply_env_overrides(|name| (name == "HYPERMIND_DEMOTE_AFTER_HOURS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("HYPERMIND_DEMOTE_AFTER_HOURS"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = HyperMindConfig::default_toml();
        assert!(toml_str.contains("default_tier = \"hot\""));
        assert!(toml_str.contains("demote_after_hours = 24"));
    }

    #[test]
    fn config_error_maps_into_core_error() {
        let err: hypermind_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, hypermind_core::Error::Config { .. }));
    }
}
