//! Independent k-means runs over a list of K values.
//!
//! Every K gets its own model, RNG and centroid set, so the runs are executed
//! concurrently on the rayon pool.

use crate::algorithm::{kmeans_lloyd, LloydOutcome};
use crate::config::KMeansConfig;
use crate::error::KMeansError;
use crate::quantize::{average_distance, average_error, quantize};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use tracing::info;

/// Palette sizes tried when the caller does not pick any
pub const DEFAULT_K_VALUES: [usize; 8] = [2, 3, 5, 10, 25, 50, 100, 256];

/// K whose per-iteration average error is logged by default
pub const DEFAULT_DIAGNOSTIC_K: usize = 5;

/// Output of one run in a sweep
#[derive(Debug, Clone)]
pub struct SweepRun {
    pub k: usize,
    pub centroids: Array2<f64>,
    /// `data` with every sample replaced by its nearest centroid
    pub quantized: Array2<f64>,
    /// WSSSE / N
    pub average_error: f64,
    /// Mean Euclidean distance between `data` and `quantized`
    pub average_distance: f64,
    pub outcome: LloydOutcome,
}

/// Cluster `data` once per entry of `k_values`
///
/// `base` supplies everything but `k`; the run whose K equals `diagnostic_k`
/// additionally logs its average error after every round. Results come back
/// in the order of `k_values`. The first failing run aborts the sweep.
pub fn run_sweep(
    data: &ArrayView2<f64>,
    k_values: &[usize],
    base: &KMeansConfig,
    diagnostic_k: Option<usize>,
) -> Result<Vec<SweepRun>, KMeansError> {
    if data.nrows() == 0 {
        return Err(KMeansError::EmptyDataset);
    }

    k_values
        .par_iter()
        .map(|&k| {
            let config = KMeansConfig {
                k,
                log_average_error: base.log_average_error || diagnostic_k == Some(k),
                ..base.clone()
            };
            run_one(data, &config)
        })
        .collect()
}

fn run_one(data: &ArrayView2<f64>, config: &KMeansConfig) -> Result<SweepRun, KMeansError> {
    let result = kmeans_lloyd(data, config)?;
    let quantized = quantize(data, &result.centroids.view())?;
    let average_error = average_error(data, &result.centroids.view())?;
    let average_distance = average_distance(data, &quantized.view())?;

    info!(
        k = config.k,
        iterations = result.outcome.n_iterations,
        average_error,
        average_distance,
        "finished k-means run"
    );

    Ok(SweepRun {
        k: config.k,
        centroids: result.centroids,
        quantized,
        average_error,
        average_distance,
        outcome: result.outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    #[test]
    fn test_sweep_keeps_k_order() {
        let data = Array2::random((400, 4), Uniform::new(0.0, 255.0));
        let base = KMeansConfig::default().with_max_iters(5).with_seed(3);

        let runs = run_sweep(&data.view(), &[10, 2, 5], &base, Some(5)).unwrap();

        let ks: Vec<usize> = runs.iter().map(|run| run.k).collect();
        assert_eq!(ks, vec![10, 2, 5]);
        for run in &runs {
            assert_eq!(run.centroids.nrows(), run.k);
            assert_eq!(run.quantized.dim(), data.dim());
            assert!(run.average_error >= 0.0);
            assert!(run.average_distance >= 0.0);
        }
    }

    #[test]
    fn test_only_diagnostic_k_records_history() {
        let data = Array2::random((200, 4), Uniform::new(0.0, 255.0));
        let base = KMeansConfig::default().with_max_iters(4);

        let runs = run_sweep(&data.view(), &[2, 5], &base, Some(5)).unwrap();

        assert!(runs[0].outcome.error_history.is_empty());
        assert_eq!(runs[1].outcome.error_history.len(), 4);
    }

    #[test]
    fn test_sweep_matches_single_runs() {
        let data = Array2::random((300, 4), Uniform::new(0.0, 255.0));
        let base = KMeansConfig::default().with_max_iters(6).with_seed(17);

        let runs = run_sweep(&data.view(), &[3, 4], &base, None).unwrap();
        let single = kmeans_lloyd(&data.view(), &KMeansConfig { k: 4, ..base }).unwrap();

        assert_eq!(runs[1].centroids, single.centroids);
    }

    #[test]
    fn test_sweep_propagates_failures() {
        let data = Array2::random((10, 4), Uniform::new(0.0, 255.0));
        let base = KMeansConfig::default();

        assert!(matches!(
            run_sweep(&data.view(), &[2, 50], &base, None),
            Err(KMeansError::InsufficientData(_))
        ));
    }
}
