//! Run command - Evaluate a descriptor
//!
//! This module implements the `run` and `output` subcommands. Both resolve
//! the lookups a descriptor references; `run` prints every output while
//! `output` prints the bare value of one.

use super::CommandContext;
use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;
use vpclookup::engine::{Engine, RunOverrides, RunReport};
use vpclookup::output::{render_exports, render_raw};

/// Provider overrides shared by `run` and `output`
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Credential profile to use instead of the descriptor's
    #[arg(long, env = "VPCLOOKUP_PROFILE")]
    pub profile: Option<String>,

    /// Region to use instead of the descriptor's
    #[arg(long, env = "VPCLOOKUP_REGION")]
    pub region: Option<String>,

    /// Do not check that the credential profile exists before calling the provider
    #[arg(long)]
    pub no_profile_check: bool,
}

impl TargetArgs {
    fn overrides(&self, ctx: &CommandContext) -> RunOverrides {
        RunOverrides {
            profile: self.profile.clone(),
            region: self.region.clone(),
            skip_profile_check: self.no_profile_check || !ctx.config.aws.profile_check(),
        }
    }

    async fn evaluate(
        &self,
        ctx: &CommandContext,
        descriptor: Option<&PathBuf>,
    ) -> Result<RunReport> {
        let descriptor = ctx.load_descriptor(descriptor)?;
        let overrides = self.overrides(ctx);
        let engine = ctx.engine();

        for (name, config) in Engine::effective_providers(&descriptor, &overrides)? {
            ctx.output.info(&format!(
                "Provider {}: profile {}, region {}",
                name,
                config.profile.as_deref().unwrap_or("<default chain>"),
                config.region
            ));
        }

        let report = engine.run(&descriptor, &overrides).await?;
        Ok(report)
    }
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the descriptor file
    pub descriptor: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Print `export NAME=value` lines instead of the usual output
    #[arg(short = 'e', long)]
    pub export: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let report = self.target.evaluate(ctx, self.descriptor.as_ref()).await?;

        if self.export {
            print!("{}", render_exports(&report.outputs));
        } else {
            ctx.output.outputs(&report.outputs)?;
        }

        Ok(0)
    }
}

/// Arguments for the output command
#[derive(Parser, Debug, Clone)]
pub struct OutputArgs {
    /// Name of the output to print
    #[arg(required = true)]
    pub name: String,

    /// Path to the descriptor file
    pub descriptor: Option<PathBuf>,

    #[command(flatten)]
    pub target: TargetArgs,
}

impl OutputArgs {
    /// Execute the output command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let report = self.target.evaluate(ctx, self.descriptor.as_ref()).await?;
        let value = render_raw(&report.outputs, &self.name)?;

        match report.outputs.get(&self.name) {
            Some(output) if ctx.output.is_json() => ctx.output.json(&output.value)?,
            _ => ctx.output.plain(&value),
        }

        Ok(0)
    }
}
