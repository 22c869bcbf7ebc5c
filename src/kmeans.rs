use crate::algorithm::{kmeans_from_centroids, kmeans_lloyd, KMeansResult, LloydOutcome};
use crate::config::KMeansConfig;
use crate::distance::assign_labels;
use crate::error::KMeansError;
use crate::quantize;
use ndarray::{Array2, ArrayView2};

/// K-means colour quantizer for ndarray datasets.
///
/// Rows are samples (for images, one pixel with its alpha/red/green/blue
/// channels), columns are features. The API mirrors FAISS and scikit-learn:
/// `train()`/`fit()` learn the centroids, `predict()` labels samples, and
/// `quantize()`/`average_error()` report on a dataset with the learned
/// centroids.
///
/// # Example
///
/// ```
/// use pixelkmeans_rs::KMeans;
/// use ndarray::Array2;
/// use ndarray_rand::RandomExt;
/// use ndarray_rand::rand_distr::Uniform;
///
/// let pixels = Array2::random((1000, 4), Uniform::new(0.0, 255.0));
///
/// let mut kmeans = KMeans::new(4, 8);
/// kmeans.train(&pixels.view()).unwrap();
///
/// let quantized = kmeans.quantize(&pixels.view()).unwrap();
/// assert_eq!(quantized.dim(), pixels.dim());
/// ```
pub struct KMeans {
    /// Model configuration
    config: KMeansConfig,

    /// Number of features (dimensions)
    d: usize,

    /// Trained centroids (None if not yet fitted)
    centroids: Option<Array2<f64>>,

    /// Summary of the last training run
    outcome: Option<LloydOutcome>,
}

impl KMeans {
    /// Create a new KMeans instance with default configuration.
    ///
    /// # Arguments
    ///
    /// * `d` - Number of features (dimensions) in the data
    /// * `k` - Number of clusters
    ///
    /// # Panics
    ///
    /// Panics if `k` is 0.
    pub fn new(d: usize, k: usize) -> Self {
        assert!(k > 0, "k must be greater than 0");

        Self {
            config: KMeansConfig::new(k),
            d,
            centroids: None,
            outcome: None,
        }
    }

    /// Create a new KMeans instance with custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.k` is 0.
    pub fn with_config(config: KMeansConfig) -> Self {
        assert!(config.k > 0, "k must be greater than 0");

        Self {
            d: 0, // Will be set on first train call
            config,
            centroids: None,
            outcome: None,
        }
    }

    /// Train the model on the given data, starting from randomly selected
    /// distinct samples.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Number of samples is less than k
    /// - The data holds fewer than k distinct samples
    /// - Data dimensions don't match (for subsequent calls)
    pub fn train(&mut self, data: &ArrayView2<f64>) -> Result<(), KMeansError> {
        self.check_features(data.ncols())?;

        let result = kmeans_lloyd(data, &self.config)?;
        self.store(result);
        Ok(())
    }

    /// Train the model starting from the given centroids instead of random ones.
    ///
    /// `initial_centroids` must hold `k` pairwise distinct rows.
    pub fn train_from_centroids(
        &mut self,
        data: &ArrayView2<f64>,
        initial_centroids: &ArrayView2<f64>,
    ) -> Result<(), KMeansError> {
        self.check_features(data.ncols())?;

        let result = kmeans_from_centroids(data, initial_centroids, &self.config)?;
        self.store(result);
        Ok(())
    }

    /// Fit the model to the data. Equivalent to `train()`.
    ///
    /// # Returns
    ///
    /// Returns `&mut Self` for method chaining.
    pub fn fit(&mut self, data: &ArrayView2<f64>) -> Result<&mut Self, KMeansError> {
        self.train(data)?;
        Ok(self)
    }

    /// Predict the nearest-centroid label of every sample.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The model has not been fitted yet
    /// - Data dimensions don't match the training data
    pub fn predict(&self, data: &ArrayView2<f64>) -> Result<Vec<usize>, KMeansError> {
        let centroids = self.fitted_centroids(data)?;

        Ok(assign_labels(
            data,
            &centroids.view(),
            self.config.chunk_size_data,
        ))
    }

    /// Fit the model and predict cluster assignments in one call.
    pub fn fit_predict(&mut self, data: &ArrayView2<f64>) -> Result<Vec<usize>, KMeansError> {
        self.train(data)?;
        self.predict(data)
    }

    /// Replace every sample with its nearest learned centroid.
    pub fn quantize(&self, data: &ArrayView2<f64>) -> Result<Array2<f64>, KMeansError> {
        let centroids = self.fitted_centroids(data)?;
        quantize::quantize(data, &centroids.view())
    }

    /// Average squared distance from each sample to its nearest learned centroid.
    pub fn average_error(&self, data: &ArrayView2<f64>) -> Result<f64, KMeansError> {
        let centroids = self.fitted_centroids(data)?;
        quantize::average_error(data, &centroids.view())
    }

    /// Get the centroids of the fitted model.
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Summary of the last training run, if any.
    pub fn outcome(&self) -> Option<&LloydOutcome> {
        self.outcome.as_ref()
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the number of features (dimensions).
    pub fn d(&self) -> usize {
        self.d
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    // Unfitted models accept any width; `d` is only fixed by a successful run
    fn check_features(&self, n_features: usize) -> Result<(), KMeansError> {
        if self.d != 0 && n_features != self.d {
            return Err(KMeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d, n_features
            )));
        }
        Ok(())
    }

    fn fitted_centroids(&self, data: &ArrayView2<f64>) -> Result<&Array2<f64>, KMeansError> {
        let centroids = self.centroids.as_ref().ok_or(KMeansError::NotFitted)?;

        if data.ncols() != self.d {
            return Err(KMeansError::InvalidDimensions(format!(
                "Expected {} features, got {}",
                self.d,
                data.ncols()
            )));
        }
        Ok(centroids)
    }

    fn store(&mut self, result: KMeansResult) {
        self.d = result.centroids.ncols();
        self.centroids = Some(result.centroids);
        self.outcome = Some(result.outcome);
    }
}
