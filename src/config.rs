use crate::error::KMeansError;

/// When the Lloyd iterator stops refining centroids
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoppingRule {
    /// Always run exactly `max_iters` rounds.
    FixedIterations,

    /// Stop once the total centroid movement of a round drops below `tol`.
    CentroidShift { tol: f64 },

    /// Stop once the average error changes by less than `tol` between rounds.
    CostDelta { tol: f64 },
}

impl StoppingRule {
    fn tolerance(&self) -> Option<f64> {
        match *self {
            StoppingRule::FixedIterations => None,
            StoppingRule::CentroidShift { tol } | StoppingRule::CostDelta { tol } => Some(tol),
        }
    }
}

/// What to do with a centroid that receives no samples in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyClusterPolicy {
    /// Leave the centroid at its previous position.
    KeepPrevious,

    /// Move the centroid onto a randomly drawn sample.
    Reseed,
}

/// Configuration for the k-means algorithm
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,

    /// Maximum number of Lloyd rounds. With [`StoppingRule::FixedIterations`]
    /// this is the exact number of rounds.
    pub max_iters: usize,

    /// Stopping strategy
    pub stopping: StoppingRule,

    /// Handling of clusters that end a round with no members
    pub empty_cluster: EmptyClusterPolicy,

    /// Random seed for centroid initialization and reseeding
    pub seed: u64,

    /// Upper bound on random draws while picking distinct initial centroids.
    /// `None` uses `max(10_000, 1_000 * k)`.
    pub max_init_draws: Option<usize>,

    /// Chunk size for data processing. Each chunk is handled by one rayon task.
    pub chunk_size_data: usize,

    /// Log the average error after every round
    pub log_average_error: bool,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 8,
            max_iters: 40,
            stopping: StoppingRule::FixedIterations,
            empty_cluster: EmptyClusterPolicy::KeepPrevious,
            seed: 0,
            max_init_draws: None,
            chunk_size_data: 51_200,
            log_average_error: false,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the stopping rule
    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    /// Set the empty cluster policy
    pub fn with_empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the draw budget of the centroid initializer
    pub fn with_max_init_draws(mut self, max_draws: Option<usize>) -> Self {
        self.max_init_draws = max_draws;
        self
    }

    /// Set the data chunk size
    pub fn with_chunk_size_data(mut self, chunk_size: usize) -> Self {
        self.chunk_size_data = chunk_size;
        self
    }

    /// Enable per-iteration average error logging
    pub fn with_log_average_error(mut self, enabled: bool) -> Self {
        self.log_average_error = enabled;
        self
    }

    /// Draw budget actually used by the initializer
    pub fn init_draw_budget(&self) -> usize {
        self.max_init_draws
            .unwrap_or_else(|| self.k.saturating_mul(1_000).max(10_000))
    }

    /// Check the values that do not depend on the data
    pub fn validate(&self) -> Result<(), KMeansError> {
        if self.k == 0 {
            return Err(KMeansError::InvalidK(
                "k must be greater than 0".to_string(),
            ));
        }
        if self.max_iters == 0 {
            return Err(KMeansError::InvalidConfig(
                "max_iters must be greater than 0".to_string(),
            ));
        }
        if self.chunk_size_data == 0 {
            return Err(KMeansError::InvalidConfig(
                "chunk_size_data must be greater than 0".to_string(),
            ));
        }
        if let Some(tol) = self.stopping.tolerance() {
            if tol.is_nan() || tol < 0.0 {
                return Err(KMeansError::InvalidConfig(format!(
                    "tolerance must be a non-negative number, got {}",
                    tol
                )));
            }
        }
        if self.max_init_draws == Some(0) {
            return Err(KMeansError::InvalidConfig(
                "max_init_draws must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
