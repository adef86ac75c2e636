//! vpclookup - resolve a cloud account's default VPC from a descriptor
//!
//! This is the main entry point for the vpclookup CLI.

mod cli;
mod config;

use cli::commands::CommandContext;
use cli::{Cli, Commands};
use config::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpclookup::provider::ProviderRegistry;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let (config, config_error) = match Config::load(cli.config.as_ref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), config.logging.log_level.as_deref());

    if let Some(e) = config_error {
        tracing::warn!("Failed to load config: {:#}", e);
    }

    // Display version if verbose
    if cli.verbosity() >= 2 {
        eprintln!("vpclookup v{} by {}", VERSION, AUTHORS);
    }

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::Run(args) => args.execute(&mut ctx).await,
        Commands::Output(args) => args.execute(&mut ctx).await,
        Commands::Validate(args) => args.execute(&mut ctx).await,
        Commands::Init(args) => args.execute(&mut ctx).await,
        Commands::Profiles(args) => args.execute(&mut ctx).await,
        Commands::Version => print_version(&ctx),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => {
            ctx.output.error(&format!("{:#}", err));
            exit_code_for(&err)
        }
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
///
/// `RUST_LOG` wins, then `-v` flags, then the configured level.
fn init_logging(verbosity: u8, configured: Option<&str>) {
    let filter = match verbosity {
        0 => configured.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbosity >= 3),
        )
        .with(env_filter)
        .init();
}

/// Map a command error to the process exit code
fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<vpclookup::Error>())
        .map(vpclookup::Error::exit_code)
        .unwrap_or(1)
}

/// Print the engine version and the built-in providers
fn print_version(ctx: &CommandContext) -> anyhow::Result<i32> {
    let registry = ProviderRegistry::with_builtin();
    let mut providers = Vec::new();
    for name in registry.names() {
        let plugin = registry.get(name)?;
        providers.push((
            name.to_string(),
            plugin.source().to_string(),
            plugin.version().to_string(),
        ));
    }

    if ctx.output.is_json() {
        let providers: Vec<_> = providers
            .iter()
            .map(|(name, source, version)| {
                serde_json::json!({ "name": name, "source": source, "version": version })
            })
            .collect();
        ctx.output.json(&serde_json::json!({
            "version": VERSION,
            "providers": providers,
        }))?;
    } else {
        ctx.output.plain(&format!("vpclookup {}", VERSION));
        for (name, source, version) in providers {
            ctx.output
                .plain(&format!("+ provider {} ({}) v{}", name, source, version));
        }
    }

    Ok(0)
}
