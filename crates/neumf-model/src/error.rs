//! Error types for the neumf-model crate.

use neumf_checkpoint::CheckpointError;
use neumf_layers::LayerError;
use thiserror::Error;

/// Error type for model construction, inference and state loading.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The hyperparameters cannot describe a valid model.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// What is wrong with the configuration
        message: String,
    },

    /// A user or item index outside `[0, count)`.
    #[error("Index {index} out of range for {table} with {count} rows")]
    OutOfRange {
        /// Name of the embedding table that rejected the index
        table: &'static str,
        /// The offending index
        index: i64,
        /// Number of rows in the table
        count: usize,
    },

    /// Batch lengths or parameter shapes disagree.
    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The batch or tensor being checked
        what: String,
        /// The expected shape
        expected: Vec<usize>,
        /// The shape that was provided
        actual: Vec<usize>,
    },

    /// Error raised by a layer.
    #[error(transparent)]
    Layer(#[from] LayerError),

    /// Error raised while building or reading a checkpoint.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

impl ModelError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
