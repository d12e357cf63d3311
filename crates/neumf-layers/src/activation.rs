//! Activations: ReLU between hidden layers, sigmoid on the fused logit.

use serde::{Deserialize, Serialize};

use crate::error::LayerResult;
use crate::layer::Layer;
use crate::tensor::Tensor;

/// Largest `f32` below 1.
const BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Logistic function `1 / (1 + e^-x)`, evaluated without overflow for any `x`.
///
/// The result always lies strictly inside `(0, 1)`: where `f32` would round
/// to an endpoint it is clamped to the nearest representable interior value.
pub fn sigmoid(x: f32) -> f32 {
    let y = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    y.clamp(f32::MIN_POSITIVE, BELOW_ONE)
}

/// `max(0, x)` per element.
///
/// ```
/// use neumf_layers::{Layer, ReLU, Tensor};
///
/// let y = ReLU.forward(&Tensor::from_data(&[1, 3], vec![-1.0, 0.0, 2.0])).unwrap();
/// assert_eq!(y.data(), &[0.0, 0.0, 2.0]);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReLU;

impl Layer for ReLU {
    fn forward(&self, input: &Tensor) -> LayerResult<Tensor> {
        Ok(input.map(|x| x.max(0.0)))
    }

    fn parameters(&self) -> Vec<&Tensor> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "ReLU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu() {
        let input = Tensor::from_data(&[1, 4], vec![-2.0, -0.5, 0.5, 3.0]);
        assert_eq!(ReLU.forward(&input).unwrap().data(), &[0.0, 0.0, 0.5, 3.0]);
    }

    #[test]
    fn test_sigmoid_range_and_symmetry() {
        for x in [-30.0f32, -3.0, -0.1, 0.0, 0.1, 3.0, 30.0] {
            let y = sigmoid(x);
            assert!(y > 0.0 && y < 1.0, "sigmoid({x}) = {y}");
            assert!((sigmoid(-x) - (1.0 - y)).abs() < 1e-6);
        }
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_sigmoid_saturates_inside_open_interval() {
        for x in [17.0f32, 20.0, 100.0, f32::MAX, f32::INFINITY] {
            let y = sigmoid(x);
            assert!(y < 1.0 && y > 0.99, "sigmoid({x}) = {y}");
        }
        for x in [-90.0f32, -200.0, f32::MIN, f32::NEG_INFINITY] {
            let y = sigmoid(x);
            assert!(y > 0.0 && y < 1e-30, "sigmoid({x}) = {y}");
        }
    }
}
