//! NeuMF CLI Library
//!
//! This crate provides the command-line interface for NeuMF checkpoints:
//!
//! - **Init**: Build a freshly initialized model from a JSON config and save `checkpoint-0`
//! - **Predict**: Score user/item pairs with a saved model
//! - **Inspect**: Summarize a checkpoint's config and tensors
//!
//! # Example
//!
//! ```bash
//! # Create a model
//! neumf init --config neumf.json --output-dir /tmp/neumf --format bincode --seed 7
//!
//! # Score three pairs
//! neumf predict --checkpoint /tmp/neumf --users 0,1,2 --items 5,6,7
//!
//! # Show tensor shapes
//! neumf inspect --checkpoint /tmp/neumf/checkpoint-0.bin
//! ```

pub mod commands;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckpointFormat, CheckpointSummary, InitCommand, InspectCommand, PredictCommand,
};

/// NeuMF - neural matrix factorization for recommendation
#[derive(Parser, Debug)]
#[command(name = "neumf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a model from a config and save its initial checkpoint
    Init(InitCommand),

    /// Score user/item pairs with a saved model
    Predict(PredictCommand),

    /// Print the config and tensor shapes stored in a checkpoint
    Inspect(InspectCommand),
}

/// Result type alias for CLI operations
pub type CliResult<T> = anyhow::Result<T>;
