//! Neural matrix factorization (NeuMF) for implicit-feedback recommendation.
//!
//! [`NeuMF`] fuses a matrix factorization branch and an MLP branch over
//! user/item embeddings into one interaction score per pair. The model is
//! inference-only: parameters come from initialization or from a checkpoint
//! produced elsewhere, and [`NeuMF::forward`] never mutates them.
//!
//! # Example
//!
//! ```
//! use neumf_model::{ForwardMode, NeuMF, NeuMFConfig};
//!
//! let config = NeuMFConfig::new(100, 500, 8, vec![16, 8, 4])
//!     .with_dropout(0.2)
//!     .with_seed(42);
//! let model = NeuMF::new(config).unwrap();
//!
//! let scores = model.predict(&[3, 3, 97], &[10, 11, 499]).unwrap();
//! assert_eq!(scores.len(), 3);
//!
//! // Training-mode dropout is reproducible for a given seed.
//! let a = model.forward(&[3], &[10], true, ForwardMode::Training { seed: 1 }).unwrap();
//! let b = model.forward(&[3], &[10], true, ForwardMode::Training { seed: 1 }).unwrap();
//! assert_eq!(a, b);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod model;
pub mod state;

pub use config::NeuMFConfig;
pub use error::{ModelError, ModelResult};
pub use model::{ForwardMode, NeuMF};
pub use state::CONFIG_METADATA_KEY;
