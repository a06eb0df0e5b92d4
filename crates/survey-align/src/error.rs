use std::fmt;

use serde::{Deserialize, Serialize};
use survey_align_core::SolveError;
use survey_align_ransac::FilterWarning;

/// Fatal conditions that stop an alignment run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    #[error("no reference geometry supplied")]
    EmptyReference,
    #[error("no surveyed label matched a reference label ({surveyed} surveyed points)")]
    NoCorrespondence { surveyed: usize },
    #[error("not enough correspondences for a rigid fit (got {got}, need {required})")]
    InsufficientData { got: usize, required: usize },
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Non-fatal findings collected during a run and returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlignWarning {
    /// An annotation had no ideal vertex within the association threshold.
    UnassociatedAnnotation {
        index: usize,
        content: String,
        nearest_label: Option<String>,
        nearest_distance: Option<f64>,
    },
    /// Two reference sets produced the same label; the later vertex won.
    LabelCollision {
        label: String,
        reference_index: usize,
    },
    /// A surveyed point's label is not in the ideal mapping.
    UnmatchedLabel { survey_id: u32, label: String },
    /// Too few pairs to run the outlier filter; all pairs were kept.
    InsufficientSamplesForFilter { pairs: usize, min_samples: usize },
    /// The outlier filter found no consensus; all pairs were kept.
    NoConsensus { trials: usize },
}

impl From<FilterWarning> for AlignWarning {
    fn from(w: FilterWarning) -> Self {
        match w {
            FilterWarning::InsufficientSamples { pairs, min_samples } => {
                AlignWarning::InsufficientSamplesForFilter { pairs, min_samples }
            }
            FilterWarning::NoConsensus { trials } => AlignWarning::NoConsensus { trials },
        }
    }
}

impl fmt::Display for AlignWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignWarning::UnassociatedAnnotation {
                index,
                content,
                nearest_label,
                nearest_distance,
            } => {
                write!(f, "annotation #{index} {content:?} not associated")?;
                if let (Some(label), Some(d)) = (nearest_label, nearest_distance) {
                    write!(f, " (nearest {label} at {d:.3})")?;
                }
                Ok(())
            }
            AlignWarning::LabelCollision {
                label,
                reference_index,
            } => write!(
                f,
                "label {label} redefined by reference set {reference_index}; later vertex kept"
            ),
            AlignWarning::UnmatchedLabel { survey_id, label } => {
                write!(f, "surveyed point {survey_id} label {label:?} has no ideal match")
            }
            AlignWarning::InsufficientSamplesForFilter { pairs, min_samples } => write!(
                f,
                "outlier filter skipped: {pairs} pairs, need at least {min_samples}"
            ),
            AlignWarning::NoConsensus { trials } => {
                write!(f, "outlier filter found no consensus in {trials} trials")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_warnings_convert() {
        assert_eq!(
            AlignWarning::from(FilterWarning::InsufficientSamples {
                pairs: 1,
                min_samples: 2
            }),
            AlignWarning::InsufficientSamplesForFilter {
                pairs: 1,
                min_samples: 2
            }
        );
        assert_eq!(
            AlignWarning::from(FilterWarning::NoConsensus { trials: 9 }),
            AlignWarning::NoConsensus { trials: 9 }
        );
    }

    #[test]
    fn warnings_serialize_with_kind_tag() {
        let w = AlignWarning::UnmatchedLabel {
            survey_id: 4,
            label: "V9-9".into(),
        };
        let json = serde_json::to_string(&w).expect("serialize");
        assert_eq!(json, r#"{"kind":"unmatched_label","survey_id":4,"label":"V9-9"}"#);
    }

    #[test]
    fn solve_errors_are_transparent() {
        let err = AlignError::from(SolveError::SvdFailed);
        assert_eq!(err.to_string(), "singular value decomposition failed");
    }
}
