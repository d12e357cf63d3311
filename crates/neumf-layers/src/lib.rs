//! Neural network layers for NeuMF.
//!
//! This crate provides the building blocks of the NeuMF recommender:
//!
//! - **Tensor**: a small row-major `f32` tensor
//! - **Initializers**: Glorot and LeCun uniform schemes drawn from a caller RNG
//! - **Dense layers**: fully connected linear transformations
//! - **Embeddings**: bounds-checked `[count, dim]` embedding tables
//! - **MLP**: stacked dense layers with ReLU and dropout
//! - **Activations**: ReLU and a saturating sigmoid
//!
//! # Quick Start
//!
//! ```
//! use neumf_layers::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mlp = MLPConfig::new(16)
//!     .add_layer(8)
//!     .add_layer(4)
//!     .build(&mut rng)
//!     .unwrap();
//!
//! let table = EmbeddingTable::new(100, 16, Initializer::LecunUniform, &mut rng);
//! let rows = table.lookup(&[1, 2, 3]).unwrap();
//! let output = mlp.forward(&rows).unwrap();
//! assert_eq!(output.shape(), &[3, 4]);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod activation;
pub mod dense;
pub mod dropout;
pub mod embedding;
pub mod error;
pub mod initializer;
pub mod layer;
pub mod mlp;
pub mod tensor;

pub use activation::{sigmoid, ReLU};
pub use dense::Dense;
pub use dropout::Dropout;
pub use embedding::EmbeddingTable;
pub use error::{LayerError, LayerResult};
pub use initializer::Initializer;
pub use layer::Layer;
pub use mlp::{MLPConfig, MLP};
pub use tensor::Tensor;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::activation::{sigmoid, ReLU};
    pub use crate::dense::Dense;
    pub use crate::dropout::Dropout;
    pub use crate::embedding::EmbeddingTable;
    pub use crate::error::{LayerError, LayerResult};
    pub use crate::initializer::Initializer;
    pub use crate::layer::Layer;
    pub use crate::mlp::{MLPConfig, MLP};
    pub use crate::tensor::Tensor;
}
