use thiserror::Error;

/// Error types for the pixelkmeans library
#[derive(Error, Debug)]
pub enum KMeansError {
    /// The number of clusters k is invalid (must be > 0)
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Not enough data points for the requested number of clusters
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The dataset has no samples
    #[error("Dataset is empty")]
    EmptyDataset,

    /// The initializer could not collect `k` distinct centroids within its draw budget
    #[error(
        "Could not select {k} distinct centroids after {draws} draws (dataset has {distinct} distinct samples)"
    )]
    InsufficientDistinctSamples {
        k: usize,
        distinct: usize,
        draws: usize,
    },

    /// Model has not been fitted yet
    #[error("Model has not been fitted. Call train() or fit() first.")]
    NotFitted,

    /// Dimension mismatch between data and model
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// Samples contain values the algorithm cannot work with (NaN, infinity)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
