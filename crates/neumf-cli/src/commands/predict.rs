//! Predict Command Implementation
//!
//! Loads a model from a checkpoint and prints one score per user/item pair.

use anyhow::{Context, Result};
use clap::Args;
use neumf_model::{ForwardMode, NeuMF};
use std::path::PathBuf;
use tracing::info;

use super::read_state;

/// Score user/item pairs with a saved model
///
/// # Example
///
/// ```bash
/// neumf predict --checkpoint /tmp/neumf --users 0,1,2 --items 5,6,7
/// ```
#[derive(Args, Debug, Clone)]
pub struct PredictCommand {
    /// Checkpoint file, or a directory whose latest checkpoint is used
    #[arg(long, short = 'c', env = "NEUMF_CHECKPOINT")]
    pub checkpoint: PathBuf,

    /// Comma-separated user indices
    #[arg(long, short = 'u', value_delimiter = ',', allow_negative_numbers = true)]
    pub users: Vec<i64>,

    /// Comma-separated item indices, paired with `--users` by position
    #[arg(long, short = 'i', value_delimiter = ',', allow_negative_numbers = true)]
    pub items: Vec<i64>,

    /// Print raw logits instead of probabilities
    #[arg(long)]
    pub logits: bool,

    /// Score in parallel chunks of this many pairs
    #[arg(long, env = "NEUMF_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,
}

impl PredictCommand {
    /// Execute the predict command, printing one score per line.
    pub fn run(&self) -> Result<()> {
        for score in self.scores()? {
            println!("{score}");
        }
        Ok(())
    }

    /// Loads the model and scores every pair in input order.
    pub fn scores(&self) -> Result<Vec<f32>> {
        let (path, state) = read_state(&self.checkpoint)?;
        let model = NeuMF::from_state(&state)
            .with_context(|| format!("Failed to load model from {:?}", path))?;
        info!(
            "Loaded model from {:?} (step {}), scoring {} pairs",
            path,
            state.global_step,
            self.users.len()
        );

        let apply_sigmoid = !self.logits;
        let scores = match self.chunk_size {
            Some(chunk_size) => {
                model.forward_parallel(&self.users, &self.items, apply_sigmoid, chunk_size)
            }
            None => model.forward(
                &self.users,
                &self.items,
                apply_sigmoid,
                ForwardMode::Inference,
            ),
        }
        .context("Scoring failed")?;
        Ok(scores)
    }
}
