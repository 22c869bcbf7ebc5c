use crate::error::KMeansError;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Pick `k` pairwise-distinct samples as starting centroids
///
/// Sample indices are drawn uniformly at random (with replacement) from `rng`
/// and a draw is accepted only when its value differs from every centroid
/// accepted so far. Equality is exact coordinate-wise `==`.
///
/// Random draws are bounded by `max_draws`. Once the budget is spent, the
/// remaining centroids are drawn uniformly from the distinct sample values not
/// chosen yet, so rare values do not make the selection fail. The caller must
/// supply a dataset with at least `k` distinct sample values; otherwise the
/// function returns [`KMeansError::InsufficientDistinctSamples`] instead of
/// looping forever.
///
/// # Arguments
/// * `data` - Samples of shape (n_samples, n_features)
/// * `k` - Number of centroids to select
/// * `rng` - Source of randomness, owned by the caller
/// * `max_draws` - Upper bound on the number of random draws
pub fn initialize_centroids<R: Rng + ?Sized>(
    data: &ArrayView2<f64>,
    k: usize,
    rng: &mut R,
    max_draws: usize,
) -> Result<Array2<f64>, KMeansError> {
    let n_samples = data.nrows();

    if k == 0 {
        return Err(KMeansError::InvalidK(
            "k must be greater than 0".to_string(),
        ));
    }
    if n_samples == 0 {
        return Err(KMeansError::EmptyDataset);
    }
    if n_samples < k {
        return Err(KMeansError::InsufficientData(format!(
            "Number of samples ({}) is less than k ({})",
            n_samples, k
        )));
    }

    let mut centroids = Array2::zeros((k, data.ncols()));
    let mut accepted = 0;
    let mut draws = 0;

    while accepted < k && draws < max_draws {
        draws += 1;

        let candidate = data.row(rng.gen_range(0..n_samples));
        let duplicate = centroids
            .outer_iter()
            .take(accepted)
            .any(|chosen| chosen == candidate);

        if !duplicate {
            centroids.row_mut(accepted).assign(&candidate);
            accepted += 1;
        }
    }

    if accepted < k {
        let distinct = distinct_sample_rows(data);
        if distinct.len() < k {
            return Err(KMeansError::InsufficientDistinctSamples {
                k,
                distinct: distinct.len(),
                draws,
            });
        }

        let chosen: HashSet<Vec<u64>> = centroids
            .outer_iter()
            .take(accepted)
            .map(|row| value_key(&row))
            .collect();
        let remaining: Vec<usize> = distinct
            .into_iter()
            .filter(|&i| !chosen.contains(&value_key(&data.row(i))))
            .collect();

        debug!(
            k,
            accepted,
            draws,
            remaining = remaining.len(),
            "draw budget spent, picking the rest from unchosen distinct values"
        );

        for &i in remaining.choose_multiple(rng, k - accepted) {
            centroids.row_mut(accepted).assign(&data.row(i));
            accepted += 1;
        }
    }

    Ok(centroids)
}

/// Number of distinct sample values, using the same equality as the initializer
pub fn count_distinct_samples(data: &ArrayView2<f64>) -> usize {
    distinct_sample_rows(data).len()
}

/// Index of the first occurrence of every distinct sample value, in row order
fn distinct_sample_rows(data: &ArrayView2<f64>) -> Vec<usize> {
    let mut seen = HashSet::new();
    data.outer_iter()
        .enumerate()
        .filter(|(_, row)| seen.insert(value_key(row)))
        .map(|(i, _)| i)
        .collect()
}

fn value_key(row: &ArrayView1<f64>) -> Vec<u64> {
    row.iter()
        // -0.0 == 0.0, so both must hash alike
        .map(|&v| if v == 0.0 { 0u64 } else { v.to_bits() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn is_sample(data: &Array2<f64>, row: ndarray::ArrayView1<f64>) -> bool {
        data.outer_iter().any(|sample| sample == row)
    }

    #[test]
    fn test_initialize_centroids() {
        let data = Array2::random((100, 4), Uniform::new(0.0, 255.0));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let centroids = initialize_centroids(&data.view(), 5, &mut rng, 10_000).unwrap();

        assert_eq!(centroids.nrows(), 5);
        assert_eq!(centroids.ncols(), 4);
        for centroid in centroids.outer_iter() {
            assert!(is_sample(&data, centroid));
        }
    }

    #[test]
    fn test_centroids_are_pairwise_distinct() {
        // Heavy duplication: only three distinct values among 300 samples
        let mut data = Array2::zeros((300, 4));
        for (i, mut row) in data.outer_iter_mut().enumerate() {
            row.fill((i % 3) as f64 * 50.0);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let centroids = initialize_centroids(&data.view(), 3, &mut rng, 10_000).unwrap();

        for a in 0..3 {
            for b in (a + 1)..3 {
                assert_ne!(centroids.row(a), centroids.row(b));
            }
        }
    }

    #[test]
    fn test_k_equals_distinct_count_uses_every_value() {
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [1.0, 2.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let centroids = initialize_centroids(&data.view(), 3, &mut rng, 10_000).unwrap();

        for expected in [array![1.0, 2.0], array![3.0, 4.0], array![5.0, 6.0]] {
            assert!(centroids.outer_iter().any(|c| c == expected.view()));
        }
    }

    #[test]
    fn test_same_seed_same_centroids() {
        let data = Array2::random((200, 4), Uniform::new(0.0, 255.0));

        let a = initialize_centroids(&data.view(), 8, &mut ChaCha8Rng::seed_from_u64(11), 10_000)
            .unwrap();
        let b = initialize_centroids(&data.view(), 8, &mut ChaCha8Rng::seed_from_u64(11), 10_000)
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_insufficient_distinct_samples_fails_instead_of_hanging() {
        let data = array![[0.0, 0.0], [0.0, 0.0], [10.0, 10.0], [10.0, 10.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let result = initialize_centroids(&data.view(), 3, &mut rng, 500);

        match result {
            Err(KMeansError::InsufficientDistinctSamples { k, distinct, draws }) => {
                assert_eq!(k, 3);
                assert_eq!(distinct, 2);
                assert_eq!(draws, 500);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rare_value_is_still_selected() {
        // One all-ones row among 100k all-zero rows
        let mut data = Array2::zeros((100_000, 4));
        data.row_mut(73_512).fill(1.0);

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let centroids = initialize_centroids(&data.view(), 2, &mut rng, 10_000).unwrap();

            assert_ne!(centroids.row(0), centroids.row(1));
            assert!(centroids.outer_iter().any(|c| c == data.row(73_512)));
            assert!(centroids.outer_iter().any(|c| c == data.row(0)));
        }
    }

    #[test]
    fn test_zero_draw_budget_picks_from_distinct_values() {
        let data = array![[1.0, 1.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [3.0, 3.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let centroids = initialize_centroids(&data.view(), 3, &mut rng, 0).unwrap();

        for expected in [array![1.0, 1.0], array![2.0, 2.0], array![3.0, 3.0]] {
            assert!(centroids.outer_iter().any(|c| c == expected.view()));
        }
    }

    #[test]
    fn test_negative_zero_counts_as_zero() {
        let data = array![[0.0, 1.0], [-0.0, 1.0]];
        assert_eq!(count_distinct_samples(&data.view()), 1);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            initialize_centroids(&data.view(), 2, &mut rng, 100),
            Err(KMeansError::InsufficientDistinctSamples { distinct: 1, .. })
        ));
    }

    #[test]
    fn test_preconditions() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let data = array![[1.0], [2.0]];

        assert!(matches!(
            initialize_centroids(&data.view(), 0, &mut rng, 10),
            Err(KMeansError::InvalidK(_))
        ));
        assert!(matches!(
            initialize_centroids(&data.view(), 3, &mut rng, 10),
            Err(KMeansError::InsufficientData(_))
        ));
        assert!(matches!(
            initialize_centroids(&Array2::<f64>::zeros((0, 4)).view(), 1, &mut rng, 10),
            Err(KMeansError::EmptyDataset)
        ));
    }
}
