//! Robust outlier rejection for survey correspondences.
//!
//! The filter repeatedly fits a rigid motion to a minimal random sample of
//! correspondence pairs, counts the pairs that agree with it, and keeps the
//! largest consensus set. Sampling is seedable through
//! [`OutlierFilterParams::seed`] so runs can be reproduced exactly.

mod filter;
mod params;

pub use filter::{filter_outliers, FilterOutcome, FilterSummary, FilterWarning};
pub use params::OutlierFilterParams;
