//! # pixelkmeans-rs
//!
//! K-means colour quantization for datasets stored as ndarray arrays.
//!
//! Each row of the input is one sample (for images, one pixel with its
//! alpha, red, green and blue channels). The crate learns K centroids with
//! Lloyd's algorithm, replaces every sample with its nearest centroid and
//! reports the reconstruction error.
//!
//! ## Features
//!
//! - **Distinct random seeding**: initial centroids are K samples with
//!   pairwise different values, drawn with a seeded `ChaCha8Rng`
//! - **Deterministic parallelism**: assignment, quantization and error
//!   reporting run on rayon over fixed row chunks and merge partial sums in
//!   chunk order
//! - **Configurable stopping**: a fixed iteration budget (default 40), or a
//!   centroid-movement or cost-delta threshold
//! - **Explicit empty-cluster policy**: keep the previous centroid or reseed
//!   it from a random sample, never NaN
//! - **K sweeps**: cluster the same data for several K values concurrently
//!
//! ## Example
//!
//! ```rust
//! use pixelkmeans_rs::KMeans;
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! // 64x64 image worth of ARGB pixels
//! let pixels = Array2::random((64 * 64, 4), Uniform::new(0.0, 255.0));
//!
//! let mut kmeans = KMeans::new(4, 16);
//! kmeans.train(&pixels.view()).unwrap();
//!
//! let quantized = kmeans.quantize(&pixels.view()).unwrap();
//! let error = kmeans.average_error(&pixels.view()).unwrap();
//! assert_eq!(quantized.dim(), pixels.dim());
//! assert!(error >= 0.0);
//! ```
//!
//! ## Custom Configuration
//!
//! ```rust
//! use pixelkmeans_rs::{EmptyClusterPolicy, KMeans, KMeansConfig, StoppingRule};
//! use ndarray::Array2;
//! use ndarray_rand::RandomExt;
//! use ndarray_rand::rand_distr::Uniform;
//!
//! let pixels = Array2::random((5000, 4), Uniform::new(0.0, 255.0));
//!
//! let config = KMeansConfig {
//!     k: 25,
//!     max_iters: 100,
//!     stopping: StoppingRule::CentroidShift { tol: 1e-6 },
//!     empty_cluster: EmptyClusterPolicy::Reseed,
//!     seed: 42,
//!     max_init_draws: None,
//!     chunk_size_data: 10_000,
//!     log_average_error: false,
//! };
//!
//! let mut kmeans = KMeans::with_config(config);
//! let labels = kmeans.fit_predict(&pixels.view()).unwrap();
//! assert_eq!(labels.len(), 5000);
//! ```

mod algorithm;
mod config;
mod distance;
mod error;
mod init;
mod kmeans;
pub mod quantize;
pub mod sweep;

pub use algorithm::{kmeans_from_centroids, kmeans_lloyd, run_lloyd, KMeansResult, LloydOutcome};
pub use config::{EmptyClusterPolicy, KMeansConfig, StoppingRule};
pub use distance::{nearest_centroid, squared_distance};
pub use error::KMeansError;
pub use init::{count_distinct_samples, initialize_centroids};
pub use kmeans::KMeans;
pub use quantize::{average_distance, average_error, quantize};
pub use sweep::{run_sweep, SweepRun, DEFAULT_DIAGNOSTIC_K, DEFAULT_K_VALUES};
