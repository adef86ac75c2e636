//! Configuration module for vpclookup
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/vpclookup/config.toml)
//! - User configuration (~/.vpclookup.toml)
//! - Project configuration (./vpclookup.toml)
//! - Environment variables
//! - Command-line arguments

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vpclookup::credentials::expand_path;

/// Descriptor file used when none is given on the command line
pub const DEFAULT_DESCRIPTOR: &str = "vpclookup.yml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// AWS settings
    pub aws: AwsConfig,

    /// Colors and output settings
    pub colors: ColorsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Default descriptor path
    pub descriptor: PathBuf,

    /// Default output format (`human` or `json`)
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            descriptor: PathBuf::from(DEFAULT_DESCRIPTOR),
            output: "human".to_string(),
        }
    }
}

/// AWS settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Check that named profiles exist before configuring the provider (default on)
    pub profile_check: Option<bool>,

    /// Overrides `AWS_CONFIG_FILE`
    pub config_file: Option<PathBuf>,

    /// Overrides `AWS_SHARED_CREDENTIALS_FILE`
    pub shared_credentials_file: Option<PathBuf>,
}

impl AwsConfig {
    pub fn profile_check(&self) -> bool {
        self.profile_check.unwrap_or(true)
    }
}

/// Colors settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Enable colors (default on)
    pub enabled: Option<bool>,
}

impl ColorsConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag is given
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        config.expand_paths();

        Ok(config)
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path (flag or VPCLOOKUP_CONFIG) takes priority
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/vpclookup/config.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vpclookup.toml"));
        }

        paths.push(PathBuf::from("vpclookup.toml"));
        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(self.merge(file_config))
    }

    /// Merge another config into this one; later files win for non-default values
    fn merge(&self, other: Config) -> Config {
        let defaults = Defaults::default();
        Config {
            defaults: Defaults {
                descriptor: if other.defaults.descriptor != defaults.descriptor {
                    other.defaults.descriptor
                } else {
                    self.defaults.descriptor.clone()
                },
                output: if other.defaults.output != defaults.output {
                    other.defaults.output
                } else {
                    self.defaults.output.clone()
                },
            },
            aws: AwsConfig {
                profile_check: other.aws.profile_check.or(self.aws.profile_check),
                config_file: other.aws.config_file.or_else(|| self.aws.config_file.clone()),
                shared_credentials_file: other
                    .aws
                    .shared_credentials_file
                    .or_else(|| self.aws.shared_credentials_file.clone()),
            },
            colors: ColorsConfig {
                enabled: other.colors.enabled.or(self.colors.enabled),
            },
            logging: LoggingConfig {
                log_level: other
                    .logging
                    .log_level
                    .or_else(|| self.logging.log_level.clone()),
            },
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // VPCLOOKUP_DESCRIPTOR
        if let Ok(path) = std::env::var("VPCLOOKUP_DESCRIPTOR") {
            self.defaults.descriptor = PathBuf::from(path);
        }

        // VPCLOOKUP_PROFILE_CHECK
        if let Ok(value) = std::env::var("VPCLOOKUP_PROFILE_CHECK") {
            self.aws.profile_check = Some(!matches!(
                value.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ));
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.colors.enabled = Some(false);
        }

        // VPCLOOKUP_LOG_LEVEL
        if let Ok(level) = std::env::var("VPCLOOKUP_LOG_LEVEL") {
            self.logging.log_level = Some(level);
        }
    }

    /// Expand a leading `~` in configured paths
    fn expand_paths(&mut self) {
        if let Some(raw) = self.defaults.descriptor.to_str() {
            self.defaults.descriptor = expand_path(raw);
        }
        for path in [&mut self.aws.config_file, &mut self.aws.shared_credentials_file]
            .into_iter()
            .flatten()
        {
            if let Some(raw) = path.to_str() {
                *path = expand_path(raw);
            }
        }
    }

    /// Descriptor to use when the command line names none
    pub fn descriptor_path(&self) -> &Path {
        &self.defaults.descriptor
    }

    /// Output format from `[defaults] output`, if it names a known format
    pub fn output_format(&self) -> Option<OutputFormat> {
        match self.defaults.output.to_ascii_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }
}
