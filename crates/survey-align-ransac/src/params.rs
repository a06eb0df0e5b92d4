use serde::{Deserialize, Serialize};

/// Configuration for [`crate::filter_outliers`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierFilterParams {
    /// Maximum distance (drawing units) between a mapped real point and its
    /// ideal point for the pair to count as an inlier.
    pub residual_threshold: f64,
    /// Pairs drawn per trial. Values below 2 are raised to 2, the minimum
    /// that pins down a rigid motion.
    pub min_samples: usize,
    /// Upper bound on sampling trials.
    pub max_trials: usize,
    /// Confidence used to shorten the run once a good consensus is found.
    ///
    /// Set to `1.0` to always run `max_trials` trials.
    pub stop_probability: f64,
    /// RNG seed. `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
}

impl Default for OutlierFilterParams {
    fn default() -> Self {
        Self {
            residual_threshold: 0.5,
            min_samples: 2,
            max_trials: 100,
            stop_probability: 0.99,
            seed: None,
        }
    }
}

impl OutlierFilterParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_residual_threshold(mut self, threshold: f64) -> Self {
        self.residual_threshold = threshold;
        self
    }

    pub fn with_max_trials(mut self, trials: usize) -> Self {
        self.max_trials = trials;
        self
    }
}
