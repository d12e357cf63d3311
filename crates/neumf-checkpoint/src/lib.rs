//! Checkpoint persistence for NeuMF models.
//!
//! A checkpoint is a [`ModelState`]: named dense tensors, a global step and
//! free-form string metadata. [`Checkpointer`] implementations write and read
//! it as JSON ([`JsonCheckpointer`]) or bincode ([`BincodeCheckpointer`], with
//! optional gzip).
//!
//! # Example
//!
//! ```no_run
//! use neumf_checkpoint::{BincodeCheckpointer, Checkpointer, CompressionType, ModelState, TensorState};
//! use std::path::Path;
//!
//! fn main() -> neumf_checkpoint::Result<()> {
//!     let mut state = ModelState::new(0);
//!     state.insert_tensor("fusion.bias", TensorState::new(vec![1], vec![0.0])?);
//!
//!     let dir = Path::new("/tmp/neumf");
//!     let checkpointer = BincodeCheckpointer::new().with_compression(CompressionType::Gzip);
//!     checkpointer.save(&checkpointer.checkpoint_path(dir, state.global_step), &state)?;
//!
//!     if let Some(latest) = checkpointer.latest(dir) {
//!         assert_eq!(checkpointer.restore(&latest)?.tensors.len(), 1);
//!     }
//!     Ok(())
//! }
//! ```

pub mod checkpointer;
pub mod state;

pub use checkpointer::{
    checkpointer_for_path, parse_step, BincodeCheckpointer, Checkpointer, CompressionType,
    JsonCheckpointer,
};
pub use state::{ModelState, TensorState, FORMAT_VERSION};

use std::path::PathBuf;
use thiserror::Error;

/// Failure while writing or reading a checkpoint.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Filesystem access failed.
    #[error("cannot access {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// No checkpoint at the requested path.
    #[error("no checkpoint at {0}")]
    NotFound(PathBuf),

    /// JSON encoding failed.
    #[error("cannot encode checkpoint as JSON: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON decoding failed.
    #[error("cannot decode JSON checkpoint: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Written by an incompatible format version.
    #[error("checkpoint format {found} is not supported (expected {expected})")]
    VersionMismatch {
        /// Version this crate writes
        expected: u32,
        /// Version in the file
        found: u32,
    },

    /// Contents are inconsistent or undecodable.
    #[error("corrupted checkpoint: {0}")]
    Corrupted(String),
}

/// Shorthand for results carrying a [`CheckpointError`].
pub type Result<T> = std::result::Result<T, CheckpointError>;
