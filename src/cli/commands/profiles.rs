//! Profiles command - List named AWS profiles

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the profiles command
#[derive(Parser, Debug, Clone)]
pub struct ProfilesArgs {
    /// Include the `default` profile
    #[arg(short = 'a', long)]
    pub all: bool,
}

impl ProfilesArgs {
    /// Execute the profiles command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let files = ctx.aws_files();
        let profiles = if self.all {
            files.profiles()?
        } else {
            files.named_profiles()?
        };

        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!(profiles))?;
            return Ok(0);
        }

        if profiles.is_empty() {
            ctx.output.warning(&format!(
                "no profiles found in {} or {}",
                files.config_file.display(),
                files.credentials_file.display()
            ));
            return Ok(0);
        }

        for profile in profiles {
            ctx.output.plain(&profile);
        }

        Ok(0)
    }
}
