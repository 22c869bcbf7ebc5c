use crate::config::{EmptyClusterPolicy, KMeansConfig, StoppingRule};
use crate::distance::{
    assign_labels, check_dimensions, check_finite, chunk_ranges, compute_centroid_shift,
    closest_centroid,
};
use crate::error::KMeansError;
use crate::init::initialize_centroids;
use crate::quantize::average_error;
use ndarray::{s, Array2, ArrayView2};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened during a run of the Lloyd iterator
#[derive(Debug, Clone, PartialEq)]
pub struct LloydOutcome {
    /// Rounds actually performed
    pub n_iterations: usize,

    /// True when a threshold stopping rule ended the run
    pub converged: bool,

    /// Total number of (round, centroid) pairs where the centroid had no members
    pub empty_cluster_events: usize,

    /// Total centroid movement in the last round
    pub final_shift: f64,

    /// Average error after each round; only filled when error logging or the
    /// cost-delta rule is enabled
    pub error_history: Vec<f64>,
}

/// Result of a full k-means run
#[derive(Debug, Clone)]
pub struct KMeansResult {
    pub centroids: Array2<f64>,
    pub labels: Vec<usize>,
    pub outcome: LloydOutcome,
}

/// Per-cluster sums and member counts for one chunk of samples
struct ClusterAccumulator {
    sums: Array2<f64>,
    counts: Vec<usize>,
}

impl ClusterAccumulator {
    fn zeros(k: usize, n_features: usize) -> Self {
        Self {
            sums: Array2::zeros((k, n_features)),
            counts: vec![0; k],
        }
    }

    fn merge(&mut self, other: &ClusterAccumulator) {
        self.sums += &other.sums;
        for (total, count) in self.counts.iter_mut().zip(&other.counts) {
            *total += count;
        }
    }
}

/// Assignment step for one chunk: label every sample and add it to its cluster
fn accumulate_chunk(
    data_chunk: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
) -> ClusterAccumulator {
    let mut acc = ClusterAccumulator::zeros(centroids.nrows(), centroids.ncols());

    for sample in data_chunk.outer_iter() {
        let (cluster_idx, _) = closest_centroid(&sample, centroids);
        acc.counts[cluster_idx] += 1;
        let mut sum = acc.sums.row_mut(cluster_idx);
        sum += &sample;
    }

    acc
}

/// Update step: move each centroid with members to the mean of its members
///
/// Returns the indices of centroids that had no members; those are left
/// untouched.
fn update_centroids(centroids: &mut Array2<f64>, totals: &ClusterAccumulator) -> Vec<usize> {
    let mut empty_clusters = Vec::new();

    for (cluster_idx, &count) in totals.counts.iter().enumerate() {
        if count > 0 {
            let mean = &totals.sums.row(cluster_idx) / count as f64;
            centroids.row_mut(cluster_idx).assign(&mean);
        } else {
            empty_clusters.push(cluster_idx);
        }
    }

    empty_clusters
}

/// Refine `centroids` in place with Lloyd's algorithm
///
/// Each round assigns every sample to its nearest centroid and replaces each
/// centroid by the mean of its members. The dataset is processed in chunks of
/// `config.chunk_size_data` rows, one rayon task per chunk, against a
/// read-only snapshot of the centroids. Partial sums are merged in chunk
/// order, so the result does not depend on the number of threads.
///
/// `rng` is only consumed by [`EmptyClusterPolicy::Reseed`].
pub fn run_lloyd<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    centroids: &mut Array2<f64>,
    config: &KMeansConfig,
    rng: &mut R,
) -> Result<LloydOutcome, KMeansError> {
    config.validate()?;
    if data.nrows() == 0 {
        return Err(KMeansError::EmptyDataset);
    }
    check_dimensions(data, &centroids.view())?;
    if centroids.nrows() != config.k {
        return Err(KMeansError::InvalidK(format!(
            "config expects {} centroids, got {}",
            config.k,
            centroids.nrows()
        )));
    }
    check_finite(data)?;
    check_finite(&centroids.view())?;

    let n_samples = data.nrows();
    let n_features = data.ncols();
    let k = centroids.nrows();
    let ranges = chunk_ranges(n_samples, config.chunk_size_data);
    let track_error =
        config.log_average_error || matches!(config.stopping, StoppingRule::CostDelta { .. });

    info!(
        n_samples,
        n_features,
        k,
        max_iters = config.max_iters,
        stopping = ?config.stopping,
        "starting Lloyd iterations"
    );

    let mut outcome = LloydOutcome {
        n_iterations: 0,
        converged: false,
        empty_cluster_events: 0,
        final_shift: 0.0,
        error_history: Vec::new(),
    };
    let mut prev_error = f64::MAX;

    for iteration in 0..config.max_iters {
        let iter_start = Instant::now();
        outcome.n_iterations = iteration + 1;

        let partials: Vec<ClusterAccumulator> = {
            let snapshot = centroids.view();
            ranges
                .par_iter()
                .map(|&(start, end)| {
                    accumulate_chunk(&data.slice(s![start..end, ..]), &snapshot)
                })
                .collect()
        };

        let mut totals = ClusterAccumulator::zeros(k, n_features);
        for partial in &partials {
            totals.merge(partial);
        }

        let prev_centroids = centroids.clone();
        let empty_clusters = update_centroids(centroids, &totals);

        if !empty_clusters.is_empty() {
            outcome.empty_cluster_events += empty_clusters.len();
            match config.empty_cluster {
                EmptyClusterPolicy::KeepPrevious => {
                    debug!(
                        iteration = iteration + 1,
                        empty = empty_clusters.len(),
                        "empty clusters keep their previous centroids"
                    );
                }
                EmptyClusterPolicy::Reseed => {
                    let picks = index::sample(rng, n_samples, empty_clusters.len().min(n_samples));
                    for (&cluster_idx, data_idx) in empty_clusters.iter().zip(picks.iter()) {
                        centroids.row_mut(cluster_idx).assign(&data.row(data_idx));
                    }
                    warn!(
                        iteration = iteration + 1,
                        reseeded = empty_clusters.len(),
                        "reinitialized empty clusters from random samples"
                    );
                }
            }
        }

        let shift = compute_centroid_shift(&prev_centroids.view(), &centroids.view());
        outcome.final_shift = shift;

        let error = if track_error {
            let err = average_error(data, &centroids.view())?;
            outcome.error_history.push(err);
            Some(err)
        } else {
            None
        };

        if config.log_average_error {
            if let Some(err) = error {
                info!(k, iteration = iteration + 1, average_error = err, "AvgWSSSE");
            }
        }

        debug!(
            iteration = iteration + 1,
            max_iters = config.max_iters,
            shift,
            elapsed_s = iter_start.elapsed().as_secs_f64(),
            "Lloyd round complete"
        );

        let stop = match config.stopping {
            StoppingRule::FixedIterations => false,
            StoppingRule::CentroidShift { tol } => shift < tol,
            StoppingRule::CostDelta { tol } => {
                error.map_or(false, |err| (prev_error - err).abs() < tol)
            }
        };
        if let Some(err) = error {
            prev_error = err;
        }

        if stop {
            outcome.converged = true;
            info!(
                iterations = iteration + 1,
                shift,
                "converged before exhausting the iteration budget"
            );
            break;
        }
    }

    Ok(outcome)
}

/// Run k-means from scratch: validate, pick distinct random centroids, iterate
///
/// Randomness comes from a `ChaCha8Rng` seeded with `config.seed`, so equal
/// inputs and configurations give equal results.
pub fn kmeans_lloyd(
    data: &ArrayView2<f64>,
    config: &KMeansConfig,
) -> Result<KMeansResult, KMeansError> {
    config.validate()?;
    check_finite(data)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let centroids = initialize_centroids(data, config.k, &mut rng, config.init_draw_budget())?;

    run_from(data, centroids, config, &mut rng)
}

/// Run k-means starting from caller-supplied centroids
///
/// The initial centroids must number `config.k`, match the data dimension and
/// be pairwise distinct.
pub fn kmeans_from_centroids(
    data: &ArrayView2<f64>,
    initial_centroids: &ArrayView2<f64>,
    config: &KMeansConfig,
) -> Result<KMeansResult, KMeansError> {
    config.validate()?;
    check_finite(data)?;
    check_dimensions(data, initial_centroids)?;
    check_finite(initial_centroids)?;

    if initial_centroids.nrows() != config.k {
        return Err(KMeansError::InvalidK(format!(
            "expected {} initial centroids, got {}",
            config.k,
            initial_centroids.nrows()
        )));
    }
    for a in 0..initial_centroids.nrows() {
        for b in (a + 1)..initial_centroids.nrows() {
            if initial_centroids.row(a) == initial_centroids.row(b) {
                return Err(KMeansError::InvalidData(format!(
                    "initial centroids {} and {} are identical",
                    a, b
                )));
            }
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    run_from(data, initial_centroids.to_owned(), config, &mut rng)
}

fn run_from(
    data: &ArrayView2<f64>,
    mut centroids: Array2<f64>,
    config: &KMeansConfig,
    rng: &mut ChaCha8Rng,
) -> Result<KMeansResult, KMeansError> {
    let outcome = run_lloyd(data, &mut centroids, config, rng)?;
    let labels = assign_labels(data, &centroids.view(), config.chunk_size_data);

    Ok(KMeansResult {
        centroids,
        labels,
        outcome,
    })
}
