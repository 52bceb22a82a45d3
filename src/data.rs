use rand::Rng;

use crate::error::InvaseError;

/// Number of target classes; labels are one-hot over these columns.
pub const CLASS_COUNT: usize = 2;

/// Mini-batches never exceed this many rows regardless of dataset size.
pub const MAX_BATCH: usize = 1000;

/// Row-major feature/label/relevance matrices for one train or test split.
///
/// Features and relevance share the same width; labels are one-hot with
/// [`CLASS_COUNT`] columns. Relevance marks the ground-truth relevant
/// features and is only consumed by evaluation, never by training.
#[derive(Clone, Debug)]
pub struct Dataset {
    features: Vec<f32>,
    labels: Vec<f32>,
    relevance: Vec<f32>,
    examples: usize,
    dimension: usize,
}

impl Dataset {
    pub fn new(
        features: Vec<f32>,
        labels: Vec<f32>,
        relevance: Vec<f32>,
        dimension: usize,
    ) -> Result<Self, InvaseError> {
        if dimension == 0 {
            return Err(InvaseError::InvalidConfiguration(
                "feature dimension must be positive",
            ));
        }
        if features.is_empty() {
            return Err(InvaseError::EmptyDataset);
        }
        if features.len() % dimension != 0 {
            return Err(InvaseError::RaggedMatrix {
                matrix: "feature",
                len: features.len(),
                rows: features.len() / dimension,
                cols: dimension,
            });
        }
        let examples = features.len() / dimension;
        if labels.len() != examples * CLASS_COUNT {
            return Err(InvaseError::RaggedMatrix {
                matrix: "label",
                len: labels.len(),
                rows: examples,
                cols: CLASS_COUNT,
            });
        }
        if relevance.len() != examples * dimension {
            return Err(InvaseError::RaggedMatrix {
                matrix: "relevance",
                len: relevance.len(),
                rows: examples,
                cols: dimension,
            });
        }
        Ok(Self {
            features,
            labels,
            relevance,
            examples,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.examples
    }

    pub fn is_empty(&self) -> bool {
        self.examples == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    pub fn relevance(&self) -> &[f32] {
        &self.relevance
    }

    pub fn feature_row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.features[start..start + self.dimension]
    }

    pub fn label_row(&self, index: usize) -> &[f32] {
        let start = index * CLASS_COUNT;
        &self.labels[start..start + CLASS_COUNT]
    }

    pub fn relevance_row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.relevance[start..start + self.dimension]
    }

    /// Effective mini-batch size: the dataset size clamped to [`MAX_BATCH`].
    pub fn batch_size(&self) -> usize {
        self.examples.min(MAX_BATCH)
    }

    /// Draws `size` rows uniformly at random with replacement.
    pub fn sample_batch<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> (Vec<f32>, Vec<f32>) {
        let mut features = Vec::with_capacity(size * self.dimension);
        let mut labels = Vec::with_capacity(size * CLASS_COUNT);
        for _ in 0..size {
            let row = rng.gen_range(0..self.examples);
            features.extend_from_slice(self.feature_row(row));
            labels.extend_from_slice(self.label_row(row));
        }
        (features, labels)
    }
}
