use serde::{Deserialize, Serialize};
use survey_align_core::{CorrespondencePair, Point2D, RigidTransform};
use survey_align_ransac::FilterSummary;

use crate::correspondence::{MappingSummary, MatchSummary};
use crate::{AlignError, AlignWarning};

/// Quality of the final fit over the pairs that reached the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub pairs: usize,
    pub rms_error: f64,
    pub max_residual: f64,
    pub angle_degrees: f64,
}

impl FitSummary {
    pub fn new(transform: &RigidTransform, pairs: &[CorrespondencePair]) -> Self {
        Self {
            pairs: pairs.len(),
            rms_error: transform.rms_error(pairs),
            max_residual: transform
                .residuals(pairs)
                .into_iter()
                .fold(0.0, f64::max),
            angle_degrees: transform.angle().to_degrees(),
        }
    }
}

/// Per-stage summaries. A stage that did not run is `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentDiagnostics {
    pub mapping: Option<MappingSummary>,
    pub matching: Option<MatchSummary>,
    pub filter: Option<FilterSummary>,
    pub fit: Option<FitSummary>,
}

/// Output of a successful run.
#[derive(Clone, Debug)]
pub struct AlignmentSuccess {
    pub transform: RigidTransform,
    /// Every surveyed position under `transform`, in input order, outliers
    /// included.
    pub transformed_points: Vec<Point2D>,
    pub warnings: Vec<AlignWarning>,
    pub diagnostics: AlignmentDiagnostics,
}

/// A run stopped by a fatal error, with whatever was collected before it.
#[derive(thiserror::Error, Clone, Debug)]
#[error("{reason}")]
pub struct AlignmentFailure {
    pub reason: AlignError,
    pub warnings: Vec<AlignWarning>,
    pub diagnostics: AlignmentDiagnostics,
}

/// Terminal state of [`crate::SurveyAligner`].
#[derive(Clone, Debug)]
pub enum AlignmentOutcome {
    Success(AlignmentSuccess),
    Failure(AlignmentFailure),
}

impl AlignmentOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, AlignmentOutcome::Success(_))
    }

    pub fn warnings(&self) -> &[AlignWarning] {
        match self {
            AlignmentOutcome::Success(s) => &s.warnings,
            AlignmentOutcome::Failure(f) => &f.warnings,
        }
    }

    pub fn diagnostics(&self) -> &AlignmentDiagnostics {
        match self {
            AlignmentOutcome::Success(s) => &s.diagnostics,
            AlignmentOutcome::Failure(f) => &f.diagnostics,
        }
    }

    pub fn into_result(self) -> Result<AlignmentSuccess, AlignmentFailure> {
        match self {
            AlignmentOutcome::Success(s) => Ok(s),
            AlignmentOutcome::Failure(f) => Err(f),
        }
    }
}
