//! Validate command - Offline descriptor checks
//!
//! Parses the descriptor, runs the structural checks and verifies version
//! requirements against the built-in providers. No provider is configured
//! and no network call is made.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the descriptor file
    pub descriptor: Option<PathBuf>,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let path = ctx.descriptor_path(self.descriptor.as_ref());
        let descriptor = ctx.load_descriptor(Some(&path))?;

        descriptor.validate()?;
        ctx.engine().check_requirements(&descriptor)?;

        let data: Vec<String> = descriptor
            .data
            .addresses()
            .map(|address| address.to_string())
            .collect();
        let outputs: Vec<&String> = descriptor.output.keys().collect();

        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({
                "valid": true,
                "descriptor": path.display().to_string(),
                "providers": descriptor.required_providers.keys().collect::<Vec<_>>(),
                "data": data,
                "outputs": outputs,
            }))?;
        } else {
            ctx.output
                .success(&format!("Descriptor is valid: {}", path.display()));
            ctx.output.info(&format!(
                "{} provider(s), {} data source(s), {} output(s)",
                descriptor.required_providers.len(),
                data.len(),
                outputs.len()
            ));
        }

        Ok(0)
    }
}
