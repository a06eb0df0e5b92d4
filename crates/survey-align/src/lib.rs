//! Align surveyed points to design geometry with a robust rigid fit.
//!
//! The pipeline:
//! - labels reference polyline vertices `V{polyline}-{vertex}` and snaps them
//!   onto nearby annotation texts,
//! - pairs surveyed points with those vertices by label,
//! - rejects inconsistent pairs with a seedable RANSAC filter,
//! - solves the rotation + translation with the Kabsch algorithm and applies
//!   it to every surveyed point.
//!
//! ## Quickstart
//!
//! ```
//! use survey_align::{AlignInput, AlignParams, SurveyAligner};
//! use survey_align::core::{Point2D, ReferenceVertexSet, SurveyedPoint};
//!
//! let references = ReferenceVertexSet::from_polylines(vec![vec![
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(10.0, 10.0),
//! ]]);
//! let surveyed = vec![
//!     SurveyedPoint::new(1, Point2D::new(2.0, 1.0), "V1-1"),
//!     SurveyedPoint::new(2, Point2D::new(12.0, 1.0), "V1-2"),
//!     SurveyedPoint::new(3, Point2D::new(12.0, 11.0), "V1-3"),
//! ];
//! let input = AlignInput::new(surveyed, references, Vec::new());
//!
//! let aligner = SurveyAligner::new(AlignParams::default().with_seed(1));
//! let result = aligner.align(&input).into_result().expect("aligned");
//! assert!((result.transform.translation.x + 2.0).abs() < 1e-9);
//! ```
//!
//! ## API map
//! - `survey_align::core`: geometry types, `RigidTransform`, the Kabsch solver.
//! - `survey_align::ransac`: the outlier filter.
//! - `survey_align::correspondence`: ideal mapping and label matching.
//! - [`SurveyAligner`]: the end-to-end pipeline.
//! - `survey_align::io`: JSON input, configuration and report files.

pub use survey_align_core as core;
pub use survey_align_ransac as ransac;

pub mod correspondence;
mod error;
pub mod io;
mod pipeline;

pub use error::{AlignError, AlignWarning};
pub use pipeline::{
    AlignInput, AlignParams, AlignmentDiagnostics, AlignmentFailure, AlignmentOutcome,
    AlignmentSuccess, FitSummary, SessionCleanup, SurveyAligner,
};

pub use survey_align_core::{Point2D, RigidTransform};
