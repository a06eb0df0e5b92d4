use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// 2D position in drawing units.
///
/// Serialized as a `[x, y]` array.
pub type Point2D = Point2<f64>;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    nalgebra::distance(a, b)
}

/// One real-world measurement (a survey / COGO point).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurveyedPoint {
    pub id: u32,
    pub position: Point2D,
    /// Free-form description naming the ideal feature this point measures.
    #[serde(default)]
    pub label: String,
}

impl SurveyedPoint {
    pub fn new(id: u32, position: Point2D, label: impl Into<String>) -> Self {
        Self {
            id,
            position,
            label: label.into(),
        }
    }
}

/// Vertices of one reference polyline, in drawing order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceVertexSet {
    /// 1-based polyline index used in the default vertex labels.
    pub index: usize,
    pub vertices: Vec<Point2D>,
}

impl ReferenceVertexSet {
    pub fn new(index: usize, vertices: Vec<Point2D>) -> Self {
        Self { index, vertices }
    }

    /// Wrap plain polylines, numbering them `1..=n` in input order.
    pub fn from_polylines<I>(polylines: I) -> Vec<Self>
    where
        I: IntoIterator<Item = Vec<Point2D>>,
    {
        polylines
            .into_iter()
            .enumerate()
            .map(|(i, vertices)| Self::new(i + 1, vertices))
            .collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Text entity placed next to a design vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationText {
    pub position: Point2D,
    #[serde(default)]
    pub content: String,
}

impl AnnotationText {
    pub fn new(position: Point2D, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
        }
    }
}

/// Design position keyed by a normalized label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabeledIdealPoint {
    pub label: String,
    pub position: Point2D,
}

/// A measured position paired with the design position it should land on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    /// Id of the surveyed point that produced this pair.
    pub survey_id: u32,
    /// Normalized label shared by both sides.
    pub label: String,
    pub real: Point2D,
    pub ideal: Point2D,
}

impl CorrespondencePair {
    pub fn new(survey_id: u32, label: impl Into<String>, real: Point2D, ideal: Point2D) -> Self {
        Self {
            survey_id,
            label: label.into(),
            real,
            ideal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point2D::new(1.0, 2.0);
        let b = Point2D::new(4.0, 6.0);
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn polylines_are_numbered_from_one() {
        let sets = ReferenceVertexSet::from_polylines(vec![
            vec![Point2D::new(0.0, 0.0)],
            Vec::new(),
            vec![Point2D::new(1.0, 1.0), Point2D::new(2.0, 2.0)],
        ]);
        let indices: Vec<usize> = sets.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(sets[1].is_empty());
    }
}
