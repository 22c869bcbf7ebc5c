use crate::error::KMeansError;
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Squared Euclidean distance between two vectors of equal length
///
/// Computed term by term rather than through the `||x||^2 + ||c||^2 - 2*x.c`
/// identity, so identical vectors are always exactly 0 apart.
///
/// # Errors
///
/// Returns [`KMeansError::InvalidDimensions`] if the lengths differ.
pub fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> Result<f64, KMeansError> {
    if a.len() != b.len() {
        return Err(KMeansError::InvalidDimensions(format!(
            "cannot compare vectors of length {} and {}",
            a.len(),
            b.len()
        )));
    }
    Ok(squared_l2(a, b))
}

/// Find the centroid closest to `sample`
///
/// Centroids are scanned in index order and the best candidate is only
/// replaced on a strictly smaller distance, so ties go to the lowest index.
///
/// # Returns
/// * `(index, squared_distance)` of the winning centroid
///
/// # Errors
///
/// Returns [`KMeansError::InvalidDimensions`] if the sample and the centroids
/// differ in feature count, and [`KMeansError::InvalidK`] for an empty
/// centroid set.
pub fn nearest_centroid(
    sample: &ArrayView1<f64>,
    centroids: &ArrayView2<f64>,
) -> Result<(usize, f64), KMeansError> {
    if centroids.nrows() == 0 {
        return Err(KMeansError::InvalidK(
            "centroid set must contain at least one centroid".to_string(),
        ));
    }
    if sample.len() != centroids.ncols() {
        return Err(KMeansError::InvalidDimensions(format!(
            "sample has {} features, centroids have {}",
            sample.len(),
            centroids.ncols()
        )));
    }
    Ok(closest_centroid(sample, centroids))
}

// Callers have already checked that the lengths agree.
#[inline]
pub(crate) fn squared_l2(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[inline]
pub(crate) fn closest_centroid(
    sample: &ArrayView1<f64>,
    centroids: &ArrayView2<f64>,
) -> (usize, f64) {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = squared_l2(sample, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = j;
        }
    }

    (best_idx, best_dist)
}

/// Fail unless `centroids` is non-empty and shares the sample dimension of `data`
pub fn check_dimensions(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
) -> Result<(), KMeansError> {
    if centroids.nrows() == 0 {
        return Err(KMeansError::InvalidK(
            "centroid set must contain at least one centroid".to_string(),
        ));
    }
    if data.ncols() != centroids.ncols() {
        return Err(KMeansError::InvalidDimensions(format!(
            "samples have {} features, centroids have {}",
            data.ncols(),
            centroids.ncols()
        )));
    }
    Ok(())
}

/// Fail on the first NaN or infinite sample coordinate
pub fn check_finite(data: &ArrayView2<f64>) -> Result<(), KMeansError> {
    if let Some(((row, col), value)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(KMeansError::InvalidData(format!(
            "sample {} has non-finite value {} at feature {}",
            row, value, col
        )));
    }
    Ok(())
}

/// Split `0..n` into consecutive `[start, end)` ranges of at most `chunk_size` rows
pub fn chunk_ranges(n: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let chunk_size = chunk_size.max(1);
    (0..n)
        .step_by(chunk_size)
        .map(|start| (start, (start + chunk_size).min(n)))
        .collect()
}

/// Nearest-centroid label of every sample, computed in parallel over row chunks
pub fn assign_labels(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    chunk_size: usize,
) -> Vec<usize> {
    let chunk_size = chunk_size.max(1);
    let mut labels = vec![0usize; data.nrows()];

    labels
        .par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk_idx, out)| {
            let start = chunk_idx * chunk_size;
            for (i, label) in out.iter_mut().enumerate() {
                *label = closest_centroid(&data.row(start + i), centroids).0;
            }
        });

    labels
}

/// Compute centroid shift (sum of L2 norms of centroid movements)
pub fn compute_centroid_shift(
    old_centroids: &ArrayView2<f64>,
    new_centroids: &ArrayView2<f64>,
) -> f64 {
    let k = old_centroids.nrows();

    (0..k)
        .into_par_iter()
        .map(|i| squared_l2(&old_centroids.row(i), &new_centroids.row(i)).sqrt())
        .collect::<Vec<f64>>()
        .iter()
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_squared_distance() {
        let a = array![1.0, 2.0, 3.0, 4.0];
        let b = array![0.0, 0.0, 0.0, 0.0];
        assert_relative_eq!(squared_distance(&a.view(), &b.view()).unwrap(), 30.0);
        assert_eq!(squared_distance(&a.view(), &a.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_find_nearest_centroid() {
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];

        let (idx, dist) = nearest_centroid(&array![1.0, 1.0].view(), &centroids.view()).unwrap();
        assert_eq!(idx, 0);
        assert_relative_eq!(dist, 2.0);

        let (idx, _) = nearest_centroid(&array![9.0, 10.0].view(), &centroids.view()).unwrap();
        assert_eq!(idx, 1);

        // (5,5) is equidistant, the first centroid wins
        let (idx, _) = nearest_centroid(&array![5.0, 5.0].view(), &centroids.view()).unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_tie_resolves_to_lowest_index() {
        let mut centroids = Array2::from_elem((7, 4), 100.0);
        centroids.row_mut(2).fill(3.0);
        centroids.row_mut(5).fill(3.0);

        let sample = array![1.0, 1.0, 1.0, 1.0];
        for _ in 0..10 {
            let (idx, dist) = nearest_centroid(&sample.view(), &centroids.view()).unwrap();
            assert_eq!(idx, 2);
            assert_relative_eq!(dist, 16.0);
        }
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let a = array![1.0, 2.0, 3.0, 4.0];
        let b = array![1.0, 2.0];
        assert!(matches!(
            squared_distance(&a.view(), &b.view()),
            Err(KMeansError::InvalidDimensions(_))
        ));

        let centroids = array![[1.0, 2.0], [9.0, 9.0]];
        assert!(matches!(
            nearest_centroid(&a.view(), &centroids.view()),
            Err(KMeansError::InvalidDimensions(_))
        ));
        assert!(matches!(
            nearest_centroid(&b.view(), &Array2::<f64>::zeros((0, 2)).view()),
            Err(KMeansError::InvalidK(_))
        ));
    }

    #[test]
    fn test_check_dimensions() {
        let data = Array2::<f64>::zeros((3, 4));
        assert!(check_dimensions(&data.view(), &Array2::zeros((2, 4)).view()).is_ok());
        assert!(matches!(
            check_dimensions(&data.view(), &Array2::zeros((2, 3)).view()),
            Err(KMeansError::InvalidDimensions(_))
        ));
        assert!(matches!(
            check_dimensions(&data.view(), &Array2::zeros((0, 4)).view()),
            Err(KMeansError::InvalidK(_))
        ));
    }

    #[test]
    fn test_chunk_ranges() {
        assert_eq!(chunk_ranges(5, 2), vec![(0, 2), (2, 4), (4, 5)]);
        assert_eq!(chunk_ranges(4, 10), vec![(0, 4)]);
        assert!(chunk_ranges(0, 3).is_empty());
    }

    #[test]
    fn test_assign_labels_independent_of_chunk_size() {
        let data = array![[0.0, 0.0], [10.0, 10.0], [5.0, 5.0], [9.0, 8.0], [1.0, -1.0]];
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];

        let expected = vec![0, 1, 0, 1, 0];
        for chunk_size in [1, 2, 3, 100] {
            assert_eq!(
                assign_labels(&data.view(), &centroids.view(), chunk_size),
                expected
            );
        }
    }

    #[test]
    fn test_centroid_shift() {
        let old = array![[0.0, 0.0], [1.0, 1.0]];
        let new = array![[1.0, 0.0], [1.0, 4.0]];

        let shift = compute_centroid_shift(&old.view(), &new.view());
        assert_relative_eq!(shift, 4.0, epsilon = 1e-12);
    }
}
