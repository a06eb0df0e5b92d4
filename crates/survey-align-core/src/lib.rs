//! Core types and utilities for survey-to-design alignment.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about labels, annotations or outlier rejection; those live in
//! `survey-align-ransac` and `survey-align`.

mod kabsch;
mod logger;
mod point;
mod rigid;

pub use kabsch::{solve, solve_points, SolveError};
pub use point::{
    distance, AnnotationText, CorrespondencePair, LabeledIdealPoint, Point2D, ReferenceVertexSet,
    SurveyedPoint,
};
pub use rigid::RigidTransform;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
