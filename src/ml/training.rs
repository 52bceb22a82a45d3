use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{Adam, AdamConfig, GradientsParams, LearningRate, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Tensor, TensorData};
use rand::Rng;

use super::networks::{Activation, CriticNetwork, SelectorNetwork};
use super::sampler;
use crate::data::{CLASS_COUNT, Dataset};
use crate::error::InvaseError;

pub const DEFAULT_TAU: f32 = 0.1;
pub const DEFAULT_LEARNING_RATE: LearningRate = 1.0e-4;

/// Additive guard applied before every logarithm.
const PROB_EPSILON: f64 = 1.0e-8;

#[derive(Clone, Debug)]
pub struct TrainingLoopConfig {
    pub steps: usize,
    /// Progress-line cadence; 0 silences the loop.
    pub log_every: usize,
}

#[derive(Clone, Debug)]
pub struct StepMetrics {
    pub step: usize,
    pub predictor_accuracy: f32,
    pub baseline_accuracy: f32,
    pub selector_loss: f32,
}

/// Policy-gradient surrogate loss for the selector.
///
/// `prediction` is the selector's current output and the only input that
/// carries gradients; the other four tensors are constants captured earlier
/// in the same training step. The advantage is the log-likelihood of the
/// true class under the predictor minus the same under the baseline, so the
/// loss depends on the two reward signals only through their difference.
pub fn selector_loss<B: Backend>(
    prediction: Tensor<B, 2>,
    selection_prob: Tensor<B, 2>,
    predictor_prob: Tensor<B, 2>,
    baseline_prob: Tensor<B, 2>,
    labels: Tensor<B, 2>,
    tau: f32,
) -> Tensor<B, 1> {
    let reward1 = (labels.clone() * predictor_prob.add_scalar(PROB_EPSILON).log()).sum_dim(1);
    let reward2 = (labels * baseline_prob.add_scalar(PROB_EPSILON).log()).sum_dim(1);
    let advantage = reward1 - reward2;

    let selected = selection_prob.clone() * prediction.clone().add_scalar(PROB_EPSILON).log();
    let rejected = (selection_prob.ones_like() - selection_prob)
        * (prediction.ones_like() - prediction.clone())
            .add_scalar(PROB_EPSILON)
            .log();
    let log_likelihood = (selected + rejected).sum_dim(1);

    let sparsity = prediction.mean_dim(1).mul_scalar(tau);
    (advantage * log_likelihood - sparsity).mean().neg()
}

/// Categorical cross-entropy for the predictor and baseline critics.
fn cross_entropy<B: Backend>(prediction: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
    (labels * prediction.add_scalar(PROB_EPSILON).log())
        .sum_dim(1)
        .mean()
        .neg()
}

/// Joint trainer for the selector (actor) and its two critics.
///
/// Owns the three networks and one Adam optimizer each; every step performs
/// the predictor, baseline, and selector updates in that fixed order, with
/// the selector's reward signals taken from the pre-update critic outputs.
pub struct InvaseTrainer<B: AutodiffBackend>
where
    B::Device: Default,
{
    selector: SelectorNetwork<B>,
    predictor: CriticNetwork<B>,
    baseline: CriticNetwork<B>,
    selector_optim: OptimizerAdaptor<Adam, SelectorNetwork<B>, B>,
    predictor_optim: OptimizerAdaptor<Adam, CriticNetwork<B>, B>,
    baseline_optim: OptimizerAdaptor<Adam, CriticNetwork<B>, B>,
    learning_rate: LearningRate,
    tau: f32,
    dimension: usize,
    step: usize,
}

impl<B> InvaseTrainer<B>
where
    B: AutodiffBackend,
    B::Device: Default,
    <B::InnerBackend as Backend>::Device: Default,
{
    pub fn new(
        dimension: usize,
        activation: Activation,
        learning_rate: LearningRate,
        tau: f32,
    ) -> Self {
        // Adam weight decay stands in for the per-layer L2 kernel penalty.
        let optim = AdamConfig::new().with_weight_decay(Some(WeightDecayConfig::new(1.0e-3)));
        Self {
            selector: SelectorNetwork::new(dimension, activation),
            predictor: CriticNetwork::new(dimension, activation),
            baseline: CriticNetwork::new(dimension, activation),
            selector_optim: optim.init(),
            predictor_optim: optim.init(),
            baseline_optim: optim.init(),
            learning_rate,
            tau,
            dimension,
            step: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn selector(&self) -> &SelectorNetwork<B> {
        &self.selector
    }

    pub fn predictor(&self) -> &CriticNetwork<B> {
        &self.predictor
    }

    pub fn baseline(&self) -> &CriticNetwork<B> {
        &self.baseline
    }

    /// Runs the alternating-update loop for `config.steps` mini-batches.
    ///
    /// Each step draws a fresh batch with replacement, so a "step" is one
    /// gradient update per network, not a pass over the dataset.
    pub fn fit<R: Rng + ?Sized>(
        &mut self,
        train: &Dataset,
        config: &TrainingLoopConfig,
        rng: &mut R,
    ) -> Result<Vec<StepMetrics>, InvaseError> {
        if train.dimension() != self.dimension {
            return Err(InvaseError::DimensionMismatch {
                expected: self.dimension,
                actual: train.dimension(),
            });
        }
        let batch_size = train.batch_size();
        let mut history = Vec::with_capacity(config.steps);
        for _ in 0..config.steps {
            let (features, labels) = train.sample_batch(batch_size, rng);
            let metrics = self.train_step(&features, &labels, batch_size, rng);
            if config.log_every > 0 && metrics.step % config.log_every == 0 {
                println!(
                    "step {}: predictor acc {:.4} | baseline acc {:.4} | selector loss {:.4}",
                    metrics.step,
                    metrics.predictor_accuracy,
                    metrics.baseline_accuracy,
                    metrics.selector_loss
                );
            }
            history.push(metrics);
        }
        Ok(history)
    }

    fn train_step<R: Rng + ?Sized>(
        &mut self,
        features: &[f32],
        labels: &[f32],
        rows: usize,
        rng: &mut R,
    ) -> StepMetrics {
        let device = B::Device::default();
        let x = Tensor::<B, 2>::from_data(
            TensorData::new(features.to_vec(), [rows, self.dimension]),
            &device,
        );
        let y = Tensor::<B, 2>::from_data(
            TensorData::new(labels.to_vec(), [rows, CLASS_COUNT]),
            &device,
        );

        // Selection probabilities for the batch, pulled to the host so the
        // mask can be sampled outside the graph.
        let selection_prob = self.selector.forward(x.clone()).detach();
        let selection_host = tensor_to_vec(selection_prob.clone());
        let mask = sampler::sample_mask(&selection_host, rng);
        let masked_host = sampler::apply_mask(features, &mask);
        let masked = Tensor::<B, 2>::from_data(
            TensorData::new(masked_host, [rows, self.dimension]),
            &device,
        );

        // One forward on the masked batch serves both purposes: its detached
        // copy is the pre-update reward signal the selector sees later in
        // the same step, and the graph-carrying tensor feeds the update.
        let prediction = self.predictor.forward(masked);
        let predictor_prob = prediction.clone().detach();
        let predictor_accuracy = accuracy(&tensor_to_vec(predictor_prob.clone()), labels);
        let loss = cross_entropy(prediction, y.clone());
        let grads = GradientsParams::from_grads(loss.backward(), &self.predictor);
        self.predictor = self
            .predictor_optim
            .step(self.learning_rate, self.predictor.clone(), grads);

        // The baseline always sees the unmasked batch; the reward is the
        // advantage of masked prediction over this full-feature reference.
        let prediction = self.baseline.forward(x.clone());
        let baseline_prob = prediction.clone().detach();
        let baseline_accuracy = accuracy(&tensor_to_vec(baseline_prob.clone()), labels);
        let loss = cross_entropy(prediction, y.clone());
        let grads = GradientsParams::from_grads(loss.backward(), &self.baseline);
        self.baseline = self
            .baseline_optim
            .step(self.learning_rate, self.baseline.clone(), grads);

        // Selector update last, against the stale pre-update critic outputs.
        let prediction = self.selector.forward(x);
        let loss = selector_loss(
            prediction,
            selection_prob,
            predictor_prob,
            baseline_prob,
            y,
            self.tau,
        );
        let selector_loss_value = tensor_to_f32(loss.clone());
        let grads = GradientsParams::from_grads(loss.backward(), &self.selector);
        self.selector = self
            .selector_optim
            .step(self.learning_rate, self.selector.clone(), grads);

        self.step += 1;
        StepMetrics {
            step: self.step - 1,
            predictor_accuracy,
            baseline_accuracy,
            selector_loss: selector_loss_value,
        }
    }

    /// Raw selection probabilities on a feature batch; read-only.
    pub fn selection_probabilities(&self, features: &[f32]) -> Result<Vec<f32>, InvaseError> {
        let rows = self.matrix_rows(features)?;
        let device = <B::InnerBackend as Backend>::Device::default();
        let input = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(features.to_vec(), [rows, self.dimension]),
            &device,
        );
        Ok(tensor_to_vec(self.selector.valid().forward(input)))
    }

    /// Class probabilities from both critics for a feature batch and a
    /// selection mask; read-only.
    ///
    /// The mask is applied by zeroing features before the predictor forward,
    /// the same convention training uses. The baseline ignores the mask.
    pub fn predict(
        &self,
        features: &[f32],
        mask: &[f32],
    ) -> Result<(Vec<f32>, Vec<f32>), InvaseError> {
        let rows = self.matrix_rows(features)?;
        if mask.len() != features.len() {
            return Err(InvaseError::RaggedMatrix {
                matrix: "mask",
                len: mask.len(),
                rows,
                cols: self.dimension,
            });
        }
        let device = <B::InnerBackend as Backend>::Device::default();
        let full = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(features.to_vec(), [rows, self.dimension]),
            &device,
        );
        let masked = Tensor::<B::InnerBackend, 2>::from_data(
            TensorData::new(sampler::apply_mask(features, mask), [rows, self.dimension]),
            &device,
        );
        let baseline = tensor_to_vec(self.baseline.valid().forward(full));
        let predictor = tensor_to_vec(self.predictor.valid().forward(masked));
        Ok((baseline, predictor))
    }

    fn matrix_rows(&self, features: &[f32]) -> Result<usize, InvaseError> {
        if features.is_empty() {
            return Err(InvaseError::EmptyDataset);
        }
        if features.len() % self.dimension != 0 {
            return Err(InvaseError::RaggedMatrix {
                matrix: "feature",
                len: features.len(),
                rows: features.len() / self.dimension,
                cols: self.dimension,
            });
        }
        Ok(features.len() / self.dimension)
    }
}

/// Fraction of rows whose thresholded positive-class probability matches the
/// one-hot label.
fn accuracy(probabilities: &[f32], labels: &[f32]) -> f32 {
    let rows = labels.len() / CLASS_COUNT;
    if rows == 0 {
        return 0.0;
    }
    let correct = probabilities
        .chunks(CLASS_COUNT)
        .zip(labels.chunks(CLASS_COUNT))
        .filter(|(prob, label)| (prob[1] > 0.5) == (label[1] > 0.5))
        .count();
    correct as f32 / rows as f32
}

fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Vec<f32> {
    tensor
        .detach()
        .into_data()
        .to_vec::<f32>()
        .unwrap_or_default()
}

fn tensor_to_f32<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor
        .detach()
        .into_data()
        .to_vec::<f32>()
        .map(|mut values| values.pop().unwrap_or_default())
        .unwrap_or_default()
}
