use burn::module::{Ignored, Module};
use burn::nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig};
use burn::tensor::Tensor;
use burn::tensor::activation::{relu, sigmoid, softmax};
use burn::tensor::backend::Backend;

use crate::data::CLASS_COUNT;

pub const SELECTOR_HIDDEN: usize = 100;
pub const CRITIC_HIDDEN: usize = 200;

const SELU_SCALE: f64 = 1.050_700_987_355_480_5;
const SELU_ALPHA: f64 = 1.673_263_242_354_377_2;

/// Hidden-layer activation shared by all three networks.
///
/// The choice is a dataset-dependent hyperparameter supplied at construction
/// time, not a universal default.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Selu,
}

impl Activation {
    pub fn apply<B: Backend, const D: usize>(self, input: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Self::Relu => relu(input),
            Self::Selu => selu(input),
        }
    }
}

/// Scaled exponential linear unit; the backend ships no built-in version.
fn selu<B: Backend, const D: usize>(input: Tensor<B, D>) -> Tensor<B, D> {
    let positive = input.clone().clamp_min(0.0);
    let negative = input.clamp_max(0.0).exp().sub_scalar(1.0).mul_scalar(SELU_ALPHA);
    (positive + negative).mul_scalar(SELU_SCALE)
}

/// Actor network producing per-feature selection probabilities.
///
/// Three dense layers ending in a per-feature sigmoid, so the output is a
/// matrix of independent probabilities rather than a normalized distribution.
#[derive(Module, Debug)]
pub struct SelectorNetwork<B: Backend> {
    dense1: Linear<B>,
    dense2: Linear<B>,
    dense3: Linear<B>,
    activation: Ignored<Activation>,
}

impl<B> SelectorNetwork<B>
where
    B: Backend,
    B::Device: Default,
{
    pub fn new(dimension: usize, activation: Activation) -> Self {
        assert!(dimension > 0, "feature dimension must be positive");
        let device = B::Device::default();
        Self {
            dense1: LinearConfig::new(dimension, SELECTOR_HIDDEN).init(&device),
            dense2: LinearConfig::new(SELECTOR_HIDDEN, SELECTOR_HIDDEN).init(&device),
            dense3: LinearConfig::new(SELECTOR_HIDDEN, dimension).init(&device),
            activation: Ignored(activation),
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let hidden = self.activation.apply(self.dense1.forward(input));
        let hidden = self.activation.apply(self.dense2.forward(hidden));
        sigmoid(self.dense3.forward(hidden))
    }
}

/// Critic network producing class probabilities.
///
/// Predictor and baseline share this architecture with independent weights:
/// the predictor consumes masked features, the baseline full features.
#[derive(Module, Debug)]
pub struct CriticNetwork<B: Backend> {
    dense1: Linear<B>,
    norm1: BatchNorm<B>,
    dense2: Linear<B>,
    norm2: BatchNorm<B>,
    output: Linear<B>,
    activation: Ignored<Activation>,
}

impl<B> CriticNetwork<B>
where
    B: Backend,
    B::Device: Default,
{
    pub fn new(dimension: usize, activation: Activation) -> Self {
        assert!(dimension > 0, "feature dimension must be positive");
        let device = B::Device::default();
        Self {
            dense1: LinearConfig::new(dimension, CRITIC_HIDDEN).init(&device),
            norm1: BatchNormConfig::new(CRITIC_HIDDEN).init(&device),
            dense2: LinearConfig::new(CRITIC_HIDDEN, CRITIC_HIDDEN).init(&device),
            norm2: BatchNormConfig::new(CRITIC_HIDDEN).init(&device),
            output: LinearConfig::new(CRITIC_HIDDEN, CLASS_COUNT).init(&device),
            activation: Ignored(activation),
        }
    }

    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let hidden = self.norm1.forward(self.dense1.forward(input));
        let hidden = self.activation.apply(hidden);
        let hidden = self.norm2.forward(self.dense2.forward(hidden));
        let hidden = self.activation.apply(hidden);
        softmax(self.output.forward(hidden), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type Backend = NdArray<f32>;

    fn batch(values: Vec<f32>, rows: usize, cols: usize) -> Tensor<Backend, 2> {
        Tensor::from_data(TensorData::new(values, [rows, cols]), &Default::default())
    }

    #[test]
    fn selector_outputs_probabilities_per_feature() {
        let network = SelectorNetwork::<Backend>::new(7, Activation::Relu);
        let input = batch(vec![0.3; 4 * 7], 4, 7);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [4, 7]);
        let values = output.into_data().to_vec::<f32>().expect("host values");
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn critic_outputs_class_distribution() {
        let network = CriticNetwork::<Backend>::new(5, Activation::Selu);
        let input = batch(vec![1.0; 3 * 5], 3, 5);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [3, CLASS_COUNT]);
        let values = output.into_data().to_vec::<f32>().expect("host values");
        for row in values.chunks(CLASS_COUNT) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1.0e-5);
        }
    }

    #[test]
    fn selu_keeps_sign_structure() {
        let input = batch(vec![-2.0, -0.5, 0.0, 0.5, 2.0, 10.0], 2, 3);
        let output = Activation::Selu.apply(input);
        let values = output.into_data().to_vec::<f32>().expect("host values");
        assert!(values[0] < 0.0 && values[0] > -1.8);
        assert!(values[2].abs() < 1.0e-6);
        assert!((values[3] - 0.5 * 1.0507).abs() < 1.0e-3);
        assert!(values[4] > values[3]);
    }
}
