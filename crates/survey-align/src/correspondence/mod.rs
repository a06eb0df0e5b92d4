//! Label-keyed correspondence building.
//!
//! Reference polylines become labeled ideal positions (`V{polyline}-{vertex}`),
//! nearby annotation texts refine those positions, and surveyed points are
//! paired with ideal positions by label.
//!
//! Labels are normalized with [`normalize_label`] on insertion and lookup, so
//! `" v1-2 "` and `"V1-2"` name the same vertex.

mod mapping;
mod matching;

pub use mapping::{
    build_ideal_mapping, vertex_label, AnnotationAssociation, IdealMapping, MappingParams,
    MappingSummary,
};
pub use matching::{match_correspondences, CorrespondenceSet, MatchSummary, UnmatchedSurvey};

/// Trim surrounding whitespace and uppercase.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}
