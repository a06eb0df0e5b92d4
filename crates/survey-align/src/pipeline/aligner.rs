use log::{debug, info};
use survey_align_core::{solve, Point2D, RigidTransform};
use survey_align_ransac::filter_outliers;

use super::{
    AlignInput, AlignParams, AlignmentDiagnostics, AlignmentFailure, AlignmentOutcome,
    AlignmentSuccess, FitSummary,
};
use crate::correspondence::{build_ideal_mapping, CorrespondenceSet};
use crate::{AlignError, AlignWarning};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pairs the solver needs for a rigid fit.
const MIN_SOLVER_PAIRS: usize = 2;

/// Hook run exactly once when a run finishes, on success and on failure.
///
/// This is where callers release session state such as selection sets.
pub trait SessionCleanup {
    fn cleanup(&mut self, outcome: &AlignmentOutcome);
}

impl<F> SessionCleanup for F
where
    F: FnMut(&AlignmentOutcome),
{
    fn cleanup(&mut self, outcome: &AlignmentOutcome) {
        self(outcome)
    }
}

/// Survey-to-design aligner.
///
/// Stages: ideal mapping, label matching, outlier filtering, Kabsch fit,
/// and application of the fit to every surveyed point.
pub struct SurveyAligner {
    params: AlignParams,
}

#[derive(Default)]
struct RunState {
    warnings: Vec<AlignWarning>,
    diagnostics: AlignmentDiagnostics,
}

impl RunState {
    fn extend(&mut self, warnings: impl IntoIterator<Item = AlignWarning>) {
        self.warnings.extend(warnings);
    }
}

impl SurveyAligner {
    pub fn new(params: AlignParams) -> Self {
        Self { params }
    }

    /// Aligner parameters.
    #[inline]
    pub fn params(&self) -> &AlignParams {
        &self.params
    }

    /// Run the pipeline without a cleanup hook.
    pub fn align(&self, input: &AlignInput) -> AlignmentOutcome {
        self.align_with_cleanup(input, &mut |_: &AlignmentOutcome| {})
    }

    /// Run the pipeline, then hand the outcome to `cleanup`.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, input, cleanup),
            fields(
                surveyed = input.surveyed.len(),
                references = input.references.len(),
                annotations = input.annotations.len()
            )
        )
    )]
    pub fn align_with_cleanup<C>(&self, input: &AlignInput, cleanup: &mut C) -> AlignmentOutcome
    where
        C: SessionCleanup + ?Sized,
    {
        let mut state = RunState::default();
        let outcome = match self.run_stages(input, &mut state) {
            Ok((transform, transformed_points)) => {
                info!(
                    "alignment succeeded: angle {:.6} deg, translation ({:.4}, {:.4}), {} warnings",
                    transform.angle().to_degrees(),
                    transform.translation.x,
                    transform.translation.y,
                    state.warnings.len()
                );
                AlignmentOutcome::Success(AlignmentSuccess {
                    transform,
                    transformed_points,
                    warnings: state.warnings,
                    diagnostics: state.diagnostics,
                })
            }
            Err(reason) => {
                info!("alignment failed: {reason}");
                AlignmentOutcome::Failure(AlignmentFailure {
                    reason,
                    warnings: state.warnings,
                    diagnostics: state.diagnostics,
                })
            }
        };
        cleanup.cleanup(&outcome);
        outcome
    }

    fn run_stages(
        &self,
        input: &AlignInput,
        state: &mut RunState,
    ) -> Result<(RigidTransform, Vec<Point2D>), AlignError> {
        let mapping = build_ideal_mapping(
            &input.references,
            &input.annotations,
            &self.params.mapping,
        )?;
        state.extend(mapping.warnings().iter().cloned());
        state.diagnostics.mapping = Some(mapping.summary());
        debug!("ideal mapping: {} labels", mapping.len());

        let matches = CorrespondenceSet::build(&input.surveyed, &mapping);
        state.extend(matches.warnings());
        state.diagnostics.matching = Some(matches.summary());
        if matches.pairs.is_empty() {
            return Err(AlignError::NoCorrespondence {
                surveyed: input.surveyed.len(),
            });
        }

        let filtered = filter_outliers(&matches.pairs, &self.params.outlier);
        state.extend(filtered.warning.clone().map(AlignWarning::from));
        state.diagnostics.filter = Some(filtered.summary());
        debug!(
            "outlier filter: {} inliers, {} outliers",
            filtered.inliers.len(),
            filtered.outlier_count()
        );

        let inliers = filtered.inliers;
        if inliers.len() < MIN_SOLVER_PAIRS {
            return Err(AlignError::InsufficientData {
                got: inliers.len(),
                required: MIN_SOLVER_PAIRS,
            });
        }

        let transform = solve(&inliers)?;
        state.diagnostics.fit = Some(FitSummary::new(&transform, &inliers));

        let transformed = transform.apply_all(&input.surveyed_positions());
        Ok((transform, transformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_align_core::{AnnotationText, ReferenceVertexSet, SurveyedPoint};

    fn pt(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    fn triangle_refs() -> Vec<ReferenceVertexSet> {
        ReferenceVertexSet::from_polylines(vec![vec![pt(0.0, 0.0), pt(10.0, 0.0), pt(10.0, 10.0)]])
    }

    fn aligner() -> SurveyAligner {
        SurveyAligner::new(AlignParams::default().with_seed(5))
    }

    #[test]
    fn cleanup_runs_once_on_success() {
        let input = AlignInput::new(
            vec![
                SurveyedPoint::new(1, pt(1.0, 1.0), "V1-1"),
                SurveyedPoint::new(2, pt(11.0, 1.0), "V1-2"),
                SurveyedPoint::new(3, pt(11.0, 11.0), "V1-3"),
            ],
            triangle_refs(),
            Vec::new(),
        );
        let mut calls = 0;
        let outcome = aligner().align_with_cleanup(&input, &mut |o: &AlignmentOutcome| {
            assert!(o.is_success());
            calls += 1;
        });
        assert_eq!(calls, 1);
        let success = outcome.into_result().expect("success");
        assert!((success.transform.translation.x + 1.0).abs() < 1e-9);
        assert!((success.transform.translation.y + 1.0).abs() < 1e-9);
        assert_eq!(success.transformed_points.len(), 3);
    }

    #[test]
    fn cleanup_runs_once_on_failure() {
        let input = AlignInput::new(
            vec![SurveyedPoint::new(1, pt(1.0, 1.0), "V1-1")],
            Vec::new(),
            Vec::new(),
        );
        let mut calls = 0;
        let outcome = aligner().align_with_cleanup(&input, &mut |o: &AlignmentOutcome| {
            assert!(!o.is_success());
            calls += 1;
        });
        assert_eq!(calls, 1);
        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.reason, AlignError::EmptyReference);
        assert!(failure.diagnostics.mapping.is_none());
    }

    #[test]
    fn no_match_keeps_warnings_so_far() {
        let input = AlignInput::new(
            vec![
                SurveyedPoint::new(1, pt(0.0, 0.0), "A"),
                SurveyedPoint::new(2, pt(1.0, 0.0), "B"),
            ],
            triangle_refs(),
            vec![AnnotationText::new(pt(100.0, 100.0), "stray")],
        );
        let failure = aligner().align(&input).into_result().unwrap_err();
        assert_eq!(failure.reason, AlignError::NoCorrespondence { surveyed: 2 });
        assert_eq!(failure.warnings.len(), 3);
        assert!(matches!(
            failure.warnings[0],
            AlignWarning::UnassociatedAnnotation { .. }
        ));
        assert_eq!(failure.diagnostics.matching.map(|m| m.unmatched), Some(2));
        assert!(failure.diagnostics.filter.is_none());
    }

    #[test]
    fn single_pair_fails_after_filter_warning() {
        let input = AlignInput::new(
            vec![SurveyedPoint::new(1, pt(0.0, 0.0), "V1-1")],
            triangle_refs(),
            Vec::new(),
        );
        let failure = aligner().align(&input).into_result().unwrap_err();
        assert_eq!(
            failure.reason,
            AlignError::InsufficientData {
                got: 1,
                required: 2
            }
        );
        assert_eq!(
            failure.warnings,
            vec![AlignWarning::InsufficientSamplesForFilter {
                pairs: 1,
                min_samples: 2
            }]
        );
        assert!(failure.diagnostics.fit.is_none());
    }

    #[test]
    fn no_consensus_warning_reaches_success() {
        // Every edge length disagrees with the design by far more than the
        // residual threshold, so no two-pair model explains even its own sample.
        let input = AlignInput::new(
            vec![
                SurveyedPoint::new(1, pt(0.0, 0.0), "V1-1"),
                SurveyedPoint::new(2, pt(10.0, 0.0), "V1-2"),
                SurveyedPoint::new(3, pt(0.0, 10.0), "V1-3"),
            ],
            ReferenceVertexSet::from_polylines(vec![vec![
                pt(0.0, 0.0),
                pt(20.0, 0.0),
                pt(0.0, 30.0),
            ]]),
            Vec::new(),
        );
        let mut params = AlignParams::default().with_seed(5);
        params.outlier.max_trials = 10;
        let aligner = SurveyAligner::new(params);
        assert_eq!(aligner.params().outlier.max_trials, 10);

        let success = aligner.align(&input).into_result().expect("success");
        assert_eq!(success.warnings, vec![AlignWarning::NoConsensus { trials: 10 }]);
        let filter = success.diagnostics.filter.expect("filter ran");
        assert!(!filter.applied);
        assert_eq!(filter.inliers, 3);
        assert_eq!(success.diagnostics.fit.map(|f| f.pairs), Some(3));
    }

    fn square_with_outlier() -> AlignInput {
        // Exact shift of (1, 2) for V1-1..V1-3; V1-4 was shot far away.
        AlignInput::new(
            vec![
                SurveyedPoint::new(1, pt(1.0, 2.0), "V1-1"),
                SurveyedPoint::new(2, pt(11.0, 2.0), "V1-2"),
                SurveyedPoint::new(3, pt(11.0, 12.0), "V1-3"),
                SurveyedPoint::new(4, pt(40.0, -25.0), "V1-4"),
            ],
            ReferenceVertexSet::from_polylines(vec![vec![
                pt(0.0, 0.0),
                pt(10.0, 0.0),
                pt(10.0, 10.0),
                pt(0.0, 10.0),
            ]]),
            Vec::new(),
        )
    }

    #[test]
    fn three_pair_samples_still_reject_the_outlier() {
        let mut params = AlignParams::default().with_seed(9);
        params.outlier.min_samples = 3;
        let success = SurveyAligner::new(params)
            .align(&square_with_outlier())
            .into_result()
            .expect("success");

        let filter = success.diagnostics.filter.expect("filter ran");
        assert!(filter.applied);
        assert_eq!(filter.inliers, 3);
        assert_eq!(filter.outliers, 1);
        assert!(success.warnings.is_empty());
        assert!((success.transform.translation.x + 1.0).abs() < 1e-9);
        assert!((success.transform.translation.y + 2.0).abs() < 1e-9);
    }

    #[test]
    fn sample_size_covering_every_pair_passes_all_through() {
        // Each sample is the whole set, outlier included, so no consensus
        // reaches the sample size and the fit sees all four pairs.
        let mut params = AlignParams::default().with_seed(9);
        params.outlier.min_samples = 4;
        let success = SurveyAligner::new(params)
            .align(&square_with_outlier())
            .into_result()
            .expect("success");

        assert!(matches!(&success.warnings[..], [AlignWarning::NoConsensus { .. }]));
        let filter = success.diagnostics.filter.expect("filter ran");
        assert!(!filter.applied);
        assert_eq!(filter.inliers, 4);
        assert_eq!(success.diagnostics.fit.map(|f| f.pairs), Some(4));
        assert!(success.diagnostics.fit.expect("fit").rms_error > 1.0);
    }
}
