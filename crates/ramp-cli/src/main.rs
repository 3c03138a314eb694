//! Ramp CLI — drive on/off-ramp flows against the sandbox anchors.
//!
//! Subcommands: capabilities, quote, onramp, offramp.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Fiat on/off-ramp flows over the anchor abstraction.
#[derive(Parser, Debug)]
#[command(name = "ramp", version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Optional TOML configuration file.
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the provider capability matrix.
    Capabilities,
    /// Request a one-shot quote.
    Quote(commands::quote::QuoteArgs),
    /// Run a full deposit flow.
    Onramp(commands::onramp::OnRampCmdArgs),
    /// Run a full withdrawal flow.
    Offramp(commands::offramp::OffRampCmdArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = config::CliConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Capabilities => commands::capabilities::run(),
        Commands::Quote(args) => commands::quote::run(args, &config).await,
        Commands::Onramp(args) => commands::onramp::run(args, &config).await,
        Commands::Offramp(args) => commands::offramp::run(args, &config).await,
    }
}
