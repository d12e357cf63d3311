//! Inspect Command Implementation

use anyhow::{Context, Result};
use clap::Args;
use neumf_model::{NeuMFConfig, CONFIG_METADATA_KEY};
use std::path::PathBuf;
use tracing::{info, warn};

use super::read_state;

/// Print the config and tensor shapes stored in a checkpoint
#[derive(Args, Debug, Clone)]
pub struct InspectCommand {
    /// Checkpoint file, or a directory whose latest checkpoint is used
    #[arg(long, short = 'c', env = "NEUMF_CHECKPOINT")]
    pub checkpoint: PathBuf,
}

/// Summary of a checkpoint's contents.
#[derive(Debug, Clone)]
pub struct CheckpointSummary {
    /// Resolved checkpoint file
    pub path: PathBuf,
    /// Global step recorded in the checkpoint
    pub global_step: u64,
    /// Model config, if the checkpoint carries one
    pub config: Option<NeuMFConfig>,
    /// Tensor names with their shapes, ordered by name
    pub tensors: Vec<(String, Vec<usize>)>,
    /// Total scalar parameter count
    pub num_parameters: usize,
}

impl InspectCommand {
    /// Execute the inspect command
    pub fn run(&self) -> Result<()> {
        let summary = self.summarize()?;

        info!("Checkpoint: {:?}", summary.path);
        info!("  - Global step: {}", summary.global_step);
        match &summary.config {
            Some(config) => info!("  - Config: {:?}", config),
            None => warn!("  - No NeuMF config in checkpoint metadata"),
        }
        for (name, shape) in &summary.tensors {
            info!("  - {}: {:?}", name, shape);
        }
        info!("  - Parameters: {}", summary.num_parameters);
        Ok(())
    }

    /// Reads the checkpoint and collects its summary.
    pub fn summarize(&self) -> Result<CheckpointSummary> {
        let (path, state) = read_state(&self.checkpoint)?;
        let config = state
            .metadata
            .get(CONFIG_METADATA_KEY)
            .map(|raw| serde_json::from_str::<NeuMFConfig>(raw))
            .transpose()
            .context("Checkpoint carries a malformed NeuMF config")?;

        Ok(CheckpointSummary {
            path,
            global_step: state.global_step,
            config,
            tensors: state
                .tensors
                .iter()
                .map(|(name, t)| (name.clone(), t.shape.clone()))
                .collect(),
            num_parameters: state.num_parameters(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neumf_checkpoint::{BincodeCheckpointer, Checkpointer, ModelState};
    use neumf_model::NeuMF;
    use tempfile::tempdir;

    #[test]
    fn test_summarize_model_checkpoint() {
        let dir = tempdir().unwrap();
        let config = NeuMFConfig::new(3, 4, 2, vec![4, 2]).with_seed(0);
        let model = NeuMF::new(config.clone()).unwrap();
        let checkpointer = BincodeCheckpointer::new();
        let path = checkpointer.checkpoint_path(dir.path(), 7);
        checkpointer.save(&path, &model.to_state(7).unwrap()).unwrap();

        let summary = InspectCommand {
            checkpoint: path.clone(),
        }
        .summarize()
        .unwrap();

        assert_eq!(summary.path, path);
        assert_eq!(summary.global_step, 7);
        assert_eq!(summary.config, Some(config));
        assert_eq!(summary.num_parameters, model.num_parameters());
        assert!(summary
            .tensors
            .contains(&("mlp.0.weight".to_string(), vec![4, 2])));
    }

    #[test]
    fn test_summarize_without_config() {
        let dir = tempdir().unwrap();
        let checkpointer = BincodeCheckpointer::new();
        checkpointer
            .save(&checkpointer.checkpoint_path(dir.path(), 1), &ModelState::new(1))
            .unwrap();

        let summary = InspectCommand {
            checkpoint: dir.path().to_path_buf(),
        }
        .summarize()
        .unwrap();
        assert!(summary.config.is_none());
        assert!(summary.tensors.is_empty());
    }

    #[test]
    fn test_missing_checkpoint() {
        let cmd = InspectCommand {
            checkpoint: PathBuf::from("/nonexistent/neumf"),
        };
        assert!(cmd.summarize().is_err());
    }
}
