pub mod networks;
pub mod sampler;
pub mod training;

pub use networks::{Activation, CRITIC_HIDDEN, CriticNetwork, SELECTOR_HIDDEN, SelectorNetwork};
pub use sampler::{apply_mask, sample_mask, threshold_mask};
pub use training::{
    DEFAULT_LEARNING_RATE, DEFAULT_TAU, InvaseTrainer, StepMetrics, TrainingLoopConfig,
    selector_loss,
};
