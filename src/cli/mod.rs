//! CLI module for vpclookup
//!
//! This module provides the command-line interface for vpclookup,
//! including argument parsing and subcommand handling.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// vpclookup - resolve a cloud account's default VPC from a descriptor
#[derive(Parser, Debug, Clone)]
#[command(name = "vpclookup")]
#[command(author = "vpclookup Contributors")]
#[command(version)]
#[command(about = "Resolve the default VPC declared in a descriptor and print its outputs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format (defaults to the configured format, then human)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "VPCLOOKUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve lookups and print every output
    Run(commands::run::RunArgs),

    /// Resolve lookups and print a single output's bare value
    Output(commands::run::OutputArgs),

    /// Check descriptor syntax and version requirements without calling the provider
    Validate(commands::validate::ValidateArgs),

    /// Write the default-VPC descriptor to a directory
    Init(commands::init::InitArgs),

    /// List named AWS profiles
    Profiles(commands::profiles::ProfilesArgs),

    /// Print version and exit
    Version,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested on the command line
    pub fn is_json(&self) -> bool {
        matches!(self.output, Some(OutputFormat::Json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["vpclookup", "run", "vpclookup.yml"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.descriptor, Some(PathBuf::from("vpclookup.yml")));
                assert!(!args.export);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "vpclookup",
            "run",
            "--profile",
            "ops",
            "--region",
            "us-west-2",
            "--export",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.descriptor, None);
                assert_eq!(args.target.profile.as_deref(), Some("ops"));
                assert_eq!(args.target.region.as_deref(), Some("us-west-2"));
                assert!(args.export);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_output_command() {
        let cli =
            Cli::try_parse_from(["vpclookup", "output", "default_vpc_id", "infra.yml"]).unwrap();
        match cli.command {
            Commands::Output(args) => {
                assert_eq!(args.name, "default_vpc_id");
                assert_eq!(args.descriptor, Some(PathBuf::from("infra.yml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["vpclookup", "-vvvv", "validate"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_json_output_flag() {
        let cli = Cli::try_parse_from(["vpclookup", "--output", "json", "profiles"]).unwrap();
        assert!(cli.is_json());

        let cli = Cli::try_parse_from(["vpclookup", "profiles"]).unwrap();
        assert_eq!(cli.output, None);
        assert!(!cli.is_json());
    }
}
