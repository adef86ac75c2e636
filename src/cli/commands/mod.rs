//! Subcommands module for vpclookup CLI
//!
//! This module contains all the subcommand implementations.

pub mod init;
pub mod profiles;
pub mod run;
pub mod validate;

use crate::cli::output::OutputFormatter;
use crate::cli::OutputFormat;
use crate::config::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vpclookup::credentials::AwsFiles;
use vpclookup::descriptor::Descriptor;
use vpclookup::engine::Engine;
use vpclookup::provider::ProviderRegistry;

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let format = cli
            .output
            .or_else(|| config.output_format())
            .unwrap_or_default();
        let use_color = !cli.no_color && config.colors.enabled();
        let output = OutputFormatter::new(
            use_color,
            format == OutputFormat::Json,
            cli.verbosity(),
        );

        Self {
            config,
            output,
        }
    }

    /// The descriptor named on the command line, or the configured default
    pub fn descriptor_path(&self, arg: Option<&PathBuf>) -> PathBuf {
        arg.cloned()
            .unwrap_or_else(|| self.config.descriptor_path().to_path_buf())
    }

    /// Load the descriptor named on the command line, or the configured default
    pub fn load_descriptor(&self, arg: Option<&PathBuf>) -> Result<Descriptor> {
        let path = self.descriptor_path(arg);
        self.output
            .info(&format!("Loading descriptor: {}", path.display()));
        let descriptor = Descriptor::from_file(&path)?;
        Ok(descriptor)
    }

    /// AWS shared files, honouring paths from the configuration
    pub fn aws_files(&self) -> AwsFiles {
        let mut files = AwsFiles::discover();
        if let Some(path) = &self.config.aws.config_file {
            files.config_file = path.clone();
        }
        if let Some(path) = &self.config.aws.shared_credentials_file {
            files.credentials_file = path.clone();
        }
        files
    }

    /// Engine with the built-in providers
    pub fn engine(&self) -> Engine {
        Engine::new(ProviderRegistry::with_builtin()).with_aws_files(self.aws_files())
    }
}

/// Write `content` to `path`, creating parent directories
pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}
