//! Layer errors.

use thiserror::Error;

/// Failure raised by a tensor operation or layer.
#[derive(Debug, Error)]
pub enum LayerError {
    /// Two shapes that must agree do not.
    #[error("expected shape {expected:?}, found {actual:?}")]
    ShapeMismatch {
        /// Shape the operation required
        expected: Vec<usize>,
        /// Shape it received
        actual: Vec<usize>,
    },

    /// Input width differs from the layer's fan-in.
    #[error("layer takes {expected} input features, got {actual}")]
    InvalidInputDimension {
        /// Fan-in of the layer
        expected: usize,
        /// Width of the input
        actual: usize,
    },

    /// Embedding lookup outside `[0, count)`.
    #[error("row {index} is outside a table of {count} rows")]
    IndexOutOfRange {
        /// Requested row
        index: i64,
        /// Rows in the table
        count: usize,
    },

    /// An index tensor holds a value that is not a whole row number.
    #[error("index value {value} is not a row number")]
    InvalidIndex {
        /// The fractional or non-finite value
        value: f32,
    },

    /// A layer was configured with unusable settings.
    #[error("invalid layer configuration: {message}")]
    ConfigError {
        /// Human-readable reason
        message: String,
    },
}

/// Shorthand for results carrying a [`LayerError`].
pub type LayerResult<T> = Result<T, LayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LayerError::ShapeMismatch {
            expected: vec![4, 2],
            actual: vec![2, 4],
        };
        assert_eq!(err.to_string(), "expected shape [4, 2], found [2, 4]");

        let err = LayerError::IndexOutOfRange {
            index: 10,
            count: 10,
        };
        assert_eq!(err.to_string(), "row 10 is outside a table of 10 rows");

        let err = LayerError::InvalidIndex { value: 1.5 };
        assert_eq!(err.to_string(), "index value 1.5 is not a row number");
    }
}
