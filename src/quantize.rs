//! Read-only reporting over a finished centroid set: quantized datasets and
//! reconstruction error.

use crate::distance::{
    assign_labels, check_dimensions, chunk_ranges, closest_centroid, squared_l2,
};
use crate::error::KMeansError;
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;

/// Rows handled per rayon task by the reporting functions
const REPORT_CHUNK_SIZE: usize = 8_192;

/// Replace every sample with a copy of its nearest centroid
///
/// The output has the same shape and row order as `data`.
///
/// # Errors
///
/// Returns [`KMeansError::InvalidDimensions`] if samples and centroids differ
/// in feature count.
pub fn quantize(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
) -> Result<Array2<f64>, KMeansError> {
    check_dimensions(data, centroids)?;

    let labels = assign_labels(data, centroids, REPORT_CHUNK_SIZE);
    Ok(centroids.select(Axis(0), &labels))
}

/// Average within-set sum of squared errors (WSSSE / N)
///
/// For every sample, the squared distance to its nearest centroid, summed and
/// divided by the number of samples. Partial sums are formed per chunk in
/// parallel and added up in chunk order.
pub fn average_error(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
) -> Result<f64, KMeansError> {
    if data.nrows() == 0 {
        return Err(KMeansError::EmptyDataset);
    }
    check_dimensions(data, centroids)?;

    let partials: Vec<f64> = chunk_ranges(data.nrows(), REPORT_CHUNK_SIZE)
        .into_par_iter()
        .map(|(start, end)| {
            data.slice(s![start..end, ..])
                .outer_iter()
                .map(|sample| closest_centroid(&sample, centroids).1)
                .sum::<f64>()
        })
        .collect();

    Ok(partials.iter().sum::<f64>() / data.nrows() as f64)
}

/// Mean Euclidean distance between corresponding rows of two datasets
///
/// Typically used to compare a dataset with its quantized version.
pub fn average_distance(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Result<f64, KMeansError> {
    if a.dim() != b.dim() {
        return Err(KMeansError::InvalidDimensions(format!(
            "cannot compare datasets of shape {:?} and {:?}",
            a.dim(),
            b.dim()
        )));
    }
    if a.nrows() == 0 {
        return Err(KMeansError::EmptyDataset);
    }

    let partials: Vec<f64> = chunk_ranges(a.nrows(), REPORT_CHUNK_SIZE)
        .into_par_iter()
        .map(|(start, end)| {
            (start..end)
                .map(|i| squared_l2(&a.row(i), &b.row(i)).sqrt())
                .sum::<f64>()
        })
        .collect();

    Ok(partials.iter().sum::<f64>() / a.nrows() as f64)
}
