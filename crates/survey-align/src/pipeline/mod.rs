//! Survey alignment pipeline.
//!
//! This module wires together ideal-mapping construction, label matching,
//! outlier rejection, the Kabsch fit and application of the fit to the full
//! surveyed set.

mod aligner;
mod input;
mod params;
mod result;

pub use aligner::{SessionCleanup, SurveyAligner};
pub use input::AlignInput;
pub use params::AlignParams;
pub use result::{
    AlignmentDiagnostics, AlignmentFailure, AlignmentOutcome, AlignmentSuccess, FitSummary,
};
