//! Init command - Write the default-VPC descriptor

use super::{write_file, CommandContext};
use crate::config::DEFAULT_DESCRIPTOR;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vpclookup::descriptor::CANONICAL_YAML;

/// Extensions `Descriptor::from_file` reads
const DESCRIPTOR_EXTENSIONS: &[&str] = &["yml", "yaml", "toml", "json"];

/// Arguments for the init command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Directory to write `vpclookup.yml` into, or the file path itself
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing descriptor
    #[arg(short = 'f', long)]
    pub force: bool,
}

impl InitArgs {
    /// Resolve where the descriptor is written
    pub fn target(&self) -> PathBuf {
        let is_file = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| DESCRIPTOR_EXTENSIONS.contains(&e))
            && !self.path.is_dir();
        if is_file {
            self.path.clone()
        } else {
            self.path.join(DEFAULT_DESCRIPTOR)
        }
    }

    /// Execute the init command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let target = self.target();

        if target.exists() && !self.force {
            ctx.output
                .error(&format!("{} already exists", target.display()));
            ctx.output.hint("Use --force to overwrite it");
            return Ok(1);
        }

        write_file(&target, CANONICAL_YAML)?;

        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({
                "created": target.display().to_string(),
            }))?;
        } else {
            ctx.output.success(&format!("Created {}", target.display()));
        }

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_directory() {
        let args = InitArgs {
            path: PathBuf::from("infra"),
            force: false,
        };
        assert_eq!(args.target(), PathBuf::from("infra/vpclookup.yml"));
    }

    #[test]
    fn test_target_file() {
        let args = InitArgs {
            path: PathBuf::from("infra/vpc.yaml"),
            force: true,
        };
        assert_eq!(args.target(), PathBuf::from("infra/vpc.yaml"));
    }

    #[test]
    fn test_target_dotted_directory() {
        let args = InitArgs {
            path: PathBuf::from("infra.d"),
            force: false,
        };
        assert_eq!(args.target(), PathBuf::from("infra.d/vpclookup.yml"));
    }
}
