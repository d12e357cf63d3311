//! NeuMF CLI - build, inspect and score NeuMF checkpoints.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neumf_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Logs go to stderr so `predict` output on stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("neumf=info".parse()?))
        .init();

    let cli = Cli::parse();

    info!("NeuMF CLI starting...");

    match cli.command {
        Commands::Init(cmd) => {
            cmd.run()?;
        }
        Commands::Predict(cmd) => cmd.run()?,
        Commands::Inspect(cmd) => cmd.run()?,
    }

    info!("NeuMF CLI completed successfully");
    Ok(())
}
