use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::data::Dataset;
use crate::error::InvaseError;
use crate::ml::Activation;

/// Feature count shared by all six benchmark variants.
pub const DIMENSION: usize = 11;

/// The six synthetic benchmarks.
///
/// Features are standard normal; the positive-class probability is
/// `1 / (1 + logit)` with a variant-specific logit over a small subset of
/// features. Syn4 through Syn6 switch between two branches on the sign of
/// the eleventh feature, which makes the relevant set instance-dependent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyntheticDataset {
    Syn1,
    Syn2,
    Syn3,
    Syn4,
    Syn5,
    Syn6,
}

impl SyntheticDataset {
    /// Hidden activation the variant was tuned with.
    pub fn activation(self) -> Activation {
        match self {
            Self::Syn1 | Self::Syn2 => Activation::Relu,
            _ => Activation::Selu,
        }
    }

    /// Generates `examples` rows deterministically from `seed`.
    pub fn generate(self, examples: usize, seed: u64) -> Result<Dataset, InvaseError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut features = Vec::with_capacity(examples * DIMENSION);
        for _ in 0..examples * DIMENSION {
            let value: f32 = rng.sample(StandardNormal);
            features.push(value);
        }

        let mut labels = Vec::with_capacity(examples * 2);
        let mut relevance = vec![0.0f32; examples * DIMENSION];
        for row in 0..examples {
            let x = &features[row * DIMENSION..(row + 1) * DIMENSION];
            let (logit, relevant) = self.logit(x);
            for &feature in relevant {
                relevance[row * DIMENSION + feature] = 1.0;
            }
            let positive_prob = 1.0 / (1.0 + logit);
            let label = if rng.r#gen::<f64>() < positive_prob {
                1.0
            } else {
                0.0
            };
            labels.push(1.0 - label);
            labels.push(label);
        }

        Dataset::new(features, labels, relevance, DIMENSION)
    }

    fn logit(self, x: &[f32]) -> (f64, &'static [usize]) {
        match self {
            Self::Syn1 => (syn1_logit(x), &[0, 1]),
            Self::Syn2 => (syn2_logit(x), &[2, 3, 4, 5]),
            Self::Syn3 => (syn3_logit(x), &[6, 7, 8, 9]),
            Self::Syn4 => {
                if x[10] < 0.0 {
                    (syn1_logit(x), &[0, 1, 10])
                } else {
                    (syn2_logit(x), &[2, 3, 4, 5, 10])
                }
            }
            Self::Syn5 => {
                if x[10] < 0.0 {
                    (syn1_logit(x), &[0, 1, 10])
                } else {
                    (syn3_logit(x), &[6, 7, 8, 9, 10])
                }
            }
            Self::Syn6 => {
                if x[10] < 0.0 {
                    (syn2_logit(x), &[2, 3, 4, 5, 10])
                } else {
                    (syn3_logit(x), &[6, 7, 8, 9, 10])
                }
            }
        }
    }
}

fn syn1_logit(x: &[f32]) -> f64 {
    (x[0] as f64 * x[1] as f64).exp()
}

fn syn2_logit(x: &[f32]) -> f64 {
    let squares: f64 = x[2..6].iter().map(|&v| (v as f64).powi(2)).sum();
    (squares - 4.0).exp()
}

fn syn3_logit(x: &[f32]) -> f64 {
    let x7 = x[6] as f64;
    let x8 = x[7] as f64;
    let x9 = x[8] as f64;
    let x10 = x[9] as f64;
    (-10.0 * (0.2 * x7).sin() + x8.abs() + x9 + (-x10).exp() - 2.4).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CLASS_COUNT;

    #[test]
    fn generated_split_has_expected_shape() {
        let dataset = SyntheticDataset::Syn1.generate(50, 0).expect("dataset");
        assert_eq!(dataset.len(), 50);
        assert_eq!(dataset.dimension(), DIMENSION);
        assert_eq!(dataset.labels().len(), 50 * CLASS_COUNT);
        assert_eq!(dataset.relevance().len(), 50 * DIMENSION);
    }

    #[test]
    fn labels_are_one_hot() {
        let dataset = SyntheticDataset::Syn3.generate(40, 7).expect("dataset");
        for row in 0..dataset.len() {
            let label = dataset.label_row(row);
            assert_eq!(label[0] + label[1], 1.0);
            assert!(label.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn syn1_marks_the_first_two_features_relevant() {
        let dataset = SyntheticDataset::Syn1.generate(25, 3).expect("dataset");
        for row in 0..dataset.len() {
            let relevance = dataset.relevance_row(row);
            assert_eq!(&relevance[..2], &[1.0, 1.0]);
            assert!(relevance[2..].iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn switch_variants_mark_the_switch_feature() {
        let dataset = SyntheticDataset::Syn4.generate(30, 5).expect("dataset");
        for row in 0..dataset.len() {
            assert_eq!(dataset.relevance_row(row)[10], 1.0);
        }
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let first = SyntheticDataset::Syn2.generate(20, 13).expect("dataset");
        let second = SyntheticDataset::Syn2.generate(20, 13).expect("dataset");
        let other = SyntheticDataset::Syn2.generate(20, 14).expect("dataset");
        assert_eq!(first.features(), second.features());
        assert_eq!(first.labels(), second.labels());
        assert_ne!(first.features(), other.features());
    }

    #[test]
    fn generating_zero_examples_fails() {
        assert!(SyntheticDataset::Syn1.generate(0, 0).is_err());
    }
}
