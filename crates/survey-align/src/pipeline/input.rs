use serde::{Deserialize, Serialize};
use survey_align_core::{AnnotationText, Point2D, ReferenceVertexSet, SurveyedPoint};

/// Everything an alignment run consumes, already reduced to plain values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignInput {
    pub surveyed: Vec<SurveyedPoint>,
    pub references: Vec<ReferenceVertexSet>,
    #[serde(default)]
    pub annotations: Vec<AnnotationText>,
}

impl AlignInput {
    pub fn new(
        surveyed: Vec<SurveyedPoint>,
        references: Vec<ReferenceVertexSet>,
        annotations: Vec<AnnotationText>,
    ) -> Self {
        Self {
            surveyed,
            references,
            annotations,
        }
    }

    /// Surveyed positions in input order.
    pub fn surveyed_positions(&self) -> Vec<Point2D> {
        self.surveyed.iter().map(|p| p.position).collect()
    }
}
