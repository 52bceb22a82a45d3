use thiserror::Error;

/// Errors that can occur when assembling datasets or driving training.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvaseError {
    #[error("feature dimension mismatch: trainer expects {expected}, data has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("ragged {matrix} matrix: {len} values do not fill {rows} rows of {cols}")]
    RaggedMatrix {
        matrix: &'static str,
        len: usize,
        rows: usize,
        cols: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
}
