//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.carefeed.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Feed refresh settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Digest rendering settings.
    #[serde(default)]
    pub digest: DigestConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding the CRM's synced JSON store.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            verbose: false,
        }
    }
}

fn default_store_dir() -> String {
    ".carefeed/store".to_string()
}

/// Feed refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Seconds between periodic recomputes in watch mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

/// Digest rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Default output format ("markdown" or "json").
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".carefeed.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref store_dir) = args.store_dir {
            self.general.store_dir = store_dir.display().to_string();
        }

        if let Some(interval) = args.poll_interval {
            self.feed.poll_interval_secs = interval;
        }

        if let Some(format) = args.format {
            self.digest.format = format.to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.store_dir, ".carefeed/store");
        assert_eq!(config.feed.poll_interval_secs, 30);
        assert_eq!(config.digest.format, "markdown");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
store_dir = "/var/lib/carefeed"
verbose = true

[feed]
poll_interval_secs = 15

[digest]
format = "json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.store_dir, "/var/lib/carefeed");
        assert!(config.general.verbose);
        assert_eq!(config.feed.poll_interval_secs, 15);
        assert_eq!(config.digest.format, "json");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[feed]\npoll_interval_secs = 5\n").unwrap();
        assert_eq!(config.feed.poll_interval_secs, 5);
        assert_eq!(config.general.store_dir, ".carefeed/store");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[feed]"));
        assert!(toml_str.contains("[digest]"));
    }
}
