use serde::{Deserialize, Serialize};
use survey_align_ransac::OutlierFilterParams;

use crate::correspondence::MappingParams;

/// Configuration for [`crate::SurveyAligner`].
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignParams {
    /// Ideal mapping and annotation association.
    pub mapping: MappingParams,
    /// Outlier rejection before the final fit.
    pub outlier: OutlierFilterParams,
}

impl AlignParams {
    /// Fix the outlier filter's RNG seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.outlier.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let params: AlignParams = serde_json::from_str("{}").expect("parse");
        assert_eq!(params, AlignParams::default());
        assert_eq!(params.mapping.annotation_threshold, 5.0);
        assert_eq!(params.outlier.residual_threshold, 0.5);
        assert_eq!(params.outlier.min_samples, 2);
        assert_eq!(params.outlier.max_trials, 100);
        assert_eq!(params.outlier.seed, None);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let params: AlignParams =
            serde_json::from_str(r#"{"outlier": {"seed": 9, "max_trials": 10}}"#).expect("parse");
        assert_eq!(params.outlier.seed, Some(9));
        assert_eq!(params.outlier.max_trials, 10);
        assert_eq!(params.outlier.residual_threshold, 0.5);
        assert_eq!(params.mapping, MappingParams::default());
    }
}
