//! CLI Command Implementations
//!
//! - [`init`]: build and save a fresh model
//! - [`predict`]: score pairs with a saved model
//! - [`inspect`]: summarize a checkpoint

mod init;
mod inspect;
mod predict;

pub use init::{CheckpointFormat, InitCommand};
pub use inspect::{CheckpointSummary, InspectCommand};
pub use predict::PredictCommand;

use anyhow::{Context, Result};
use neumf_checkpoint::{
    checkpointer_for_path, parse_step, BincodeCheckpointer, Checkpointer, CompressionType,
    JsonCheckpointer, ModelState,
};
use std::path::{Path, PathBuf};

/// Resolves `path` to a checkpoint file.
///
/// A directory resolves to its highest-step checkpoint across all formats.
pub(crate) fn resolve_checkpoint(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        anyhow::bail!("Checkpoint path does not exist: {:?}", path);
    }
    if !path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let candidates: [Box<dyn Checkpointer>; 3] = [
        Box::new(JsonCheckpointer::new()),
        Box::new(BincodeCheckpointer::new()),
        Box::new(BincodeCheckpointer::new().with_compression(CompressionType::Gzip)),
    ];
    candidates
        .iter()
        .filter_map(|c| {
            let latest = c.latest(path)?;
            let step = parse_step(latest.file_name()?.to_str()?, c.extension())?;
            Some((step, latest))
        })
        .max_by_key(|(step, _)| *step)
        .map(|(_, latest)| latest)
        .with_context(|| format!("No checkpoint found in {:?}", path))
}

/// Reads a checkpoint file or directory, choosing the format from the file name.
pub(crate) fn read_state(path: &Path) -> Result<(PathBuf, ModelState)> {
    let file = resolve_checkpoint(path)?;
    let checkpointer = checkpointer_for_path(&file)
        .with_context(|| format!("Unrecognised checkpoint extension: {:?}", file))?;
    let state = checkpointer
        .restore(&file)
        .with_context(|| format!("Failed to restore checkpoint {:?}", file))?;
    Ok((file, state))
}
