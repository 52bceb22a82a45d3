//! Instance-wise variable selection (INVASE) trained with policy gradients
//! against a masked-feature predictor and a full-feature baseline.

pub mod data;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod synthetic;

pub use crate::data::{CLASS_COUNT, Dataset, MAX_BATCH};
pub use crate::error::InvaseError;
pub use crate::metrics::{
    SelectionPerformance, accuracy_score, average_precision_score, roc_auc_score,
    selection_performance,
};
pub use crate::ml::{
    Activation, CriticNetwork, DEFAULT_LEARNING_RATE, DEFAULT_TAU, InvaseTrainer, SelectorNetwork,
    StepMetrics, TrainingLoopConfig, apply_mask, sample_mask, selector_loss, threshold_mask,
};
pub use crate::synthetic::{DIMENSION, SyntheticDataset};
