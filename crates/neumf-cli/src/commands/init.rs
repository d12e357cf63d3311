//! Init Command Implementation
//!
//! Builds a freshly initialized NeuMF model from a JSON config file and writes
//! its parameters as `checkpoint-0`.

use anyhow::{Context, Result};
use clap::Args;
use neumf_checkpoint::{BincodeCheckpointer, Checkpointer, CompressionType, JsonCheckpointer};
use neumf_model::{NeuMF, NeuMFConfig};
use std::path::{Path, PathBuf};
use tracing::info;

/// On-disk checkpoint encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CheckpointFormat {
    /// Human-readable JSON
    #[default]
    Json,
    /// Compact bincode
    Bincode,
}

impl std::fmt::Display for CheckpointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointFormat::Json => write!(f, "json"),
            CheckpointFormat::Bincode => write!(f, "bincode"),
        }
    }
}

/// Build a model and save its initial checkpoint
///
/// # Example
///
/// ```bash
/// neumf init --config neumf.json --output-dir /tmp/neumf --format bincode --compress
/// ```
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// JSON file containing a NeuMF config
    #[arg(long, short = 'c', env = "NEUMF_CONFIG")]
    pub config: PathBuf,

    /// Directory to write the checkpoint into
    #[arg(long, short = 'o', env = "NEUMF_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Checkpoint format
    #[arg(long, short = 'f', default_value = "json")]
    pub format: CheckpointFormat,

    /// Gzip-compress bincode checkpoints
    #[arg(long)]
    pub compress: bool,

    /// Initialization seed, overriding any seed in the config file
    #[arg(long, env = "NEUMF_SEED")]
    pub seed: Option<u64>,
}

impl InitCommand {
    /// Execute the init command, returning the checkpoint path.
    pub fn run(&self) -> Result<PathBuf> {
        info!("Initializing NeuMF model from {:?}", self.config);

        let mut config = read_config(&self.config)?;
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }

        let model = NeuMF::new(config).context("Failed to build model")?;
        let state = model.to_state(0).context("Failed to capture model state")?;

        let checkpointer = self.checkpointer();
        let path = checkpointer.checkpoint_path(&self.output_dir, 0);
        checkpointer
            .save(&path, &state)
            .with_context(|| format!("Failed to write checkpoint {:?}", path))?;

        info!(
            "Wrote {} checkpoint with {} parameters to {:?}",
            self.format,
            model.num_parameters(),
            path
        );
        Ok(path)
    }

    fn checkpointer(&self) -> Box<dyn Checkpointer> {
        match self.format {
            CheckpointFormat::Json => Box::new(JsonCheckpointer::pretty()),
            CheckpointFormat::Bincode if self.compress => Box::new(
                BincodeCheckpointer::new().with_compression(CompressionType::Gzip),
            ),
            CheckpointFormat::Bincode => Box::new(BincodeCheckpointer::new()),
        }
    }
}

/// Reads and validates a JSON config file.
pub(crate) fn read_config(path: &Path) -> Result<NeuMFConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: NeuMFConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid NeuMF config in {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid NeuMF config in {:?}", path))?;
    Ok(config)
}
