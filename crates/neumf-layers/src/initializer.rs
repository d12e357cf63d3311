//! Weight initializers.
//!
//! Each initializer fills a tensor of a requested shape by drawing from a
//! caller-supplied RNG, so a seeded `StdRng` gives reproducible parameters.
//!
//! Shapes follow the layer conventions of this crate: dense kernels are
//! `[fan_in, fan_out]` and embedding tables are `[count, dimension]`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// Parameter initialization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum Initializer {
    /// Glorot/Xavier uniform: `U(-l, l)` with `l = sqrt(6 / (fan_in + fan_out))`.
    #[default]
    GlorotUniform,
    /// LeCun uniform over the last axis: `U(-l, l)` with `l = sqrt(3 / dim)`.
    ///
    /// Used for embedding tables, where `dim` is the embedding width.
    LecunUniform,
    /// All zeros, used for biases.
    Zeros,
}

impl Initializer {
    /// Returns the symmetric sampling bound for `shape`, if this is a
    /// zero-centred uniform scheme.
    pub fn bound(&self, shape: &[usize]) -> Option<f32> {
        match self {
            Initializer::GlorotUniform => {
                let (fan_in, fan_out) = fan_in_out(shape);
                Some((6.0 / (fan_in + fan_out) as f32).sqrt())
            }
            Initializer::LecunUniform => {
                let dim = shape.last().copied().unwrap_or(1).max(1);
                Some((3.0 / dim as f32).sqrt())
            }
            Initializer::Zeros => None,
        }
    }

    /// Creates a tensor of `shape` filled according to this scheme.
    pub fn initialize<R: Rng + ?Sized>(&self, shape: &[usize], rng: &mut R) -> Tensor {
        match self.bound(shape) {
            Some(limit) => {
                let n: usize = shape.iter().product();
                let values = (0..n).map(|_| rng.gen_range(-limit..=limit)).collect();
                Tensor::from_data(shape, values)
            }
            None => Tensor::zeros(shape),
        }
    }
}

fn fan_in_out(shape: &[usize]) -> (usize, usize) {
    if shape.len() >= 2 {
        (shape[0].max(1), shape[1].max(1))
    } else if shape.len() == 1 {
        let dim = shape[0].max(1);
        (dim, dim)
    } else {
        (1, 1)
    }
}
