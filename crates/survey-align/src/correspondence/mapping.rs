use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use survey_align_core::{distance, AnnotationText, LabeledIdealPoint, Point2D, ReferenceVertexSet};

use super::normalize_label;
use crate::{AlignError, AlignWarning};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Settings for turning reference geometry into labeled ideal points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingParams {
    /// An annotation moves the nearest ideal vertex onto itself when it lies
    /// strictly closer than this (drawing units).
    pub annotation_threshold: f64,
}

impl Default for MappingParams {
    fn default() -> Self {
        Self {
            annotation_threshold: 5.0,
        }
    }
}

/// Default label of vertex `vertex` on polyline `polyline` (both 1-based).
pub fn vertex_label(polyline: usize, vertex: usize) -> String {
    format!("V{polyline}-{vertex}")
}

/// An annotation that refined an ideal position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationAssociation {
    /// Index into the annotation input.
    pub annotation: usize,
    pub content: String,
    pub label: String,
    /// Distance from the annotation to the vertex before it was moved.
    pub distance: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingSummary {
    pub reference_sets: usize,
    pub ideal_points: usize,
    pub label_collisions: usize,
    pub annotations_associated: usize,
    pub annotations_unassociated: usize,
}

/// Ideal positions keyed by normalized label, in first-insertion order.
///
/// Iteration order is stable: a label keeps the slot of its first insertion
/// even when a later reference set overwrites its position.
#[derive(Clone, Debug, Default)]
pub struct IdealMapping {
    points: Vec<LabeledIdealPoint>,
    index: HashMap<String, usize>,
    reference_sets: usize,
    collisions: usize,
    associations: Vec<AnnotationAssociation>,
    warnings: Vec<AlignWarning>,
}

impl IdealMapping {
    /// Label every vertex of the non-empty reference sets.
    ///
    /// Fails with [`AlignError::EmptyReference`] when no set has a vertex.
    pub fn from_references(references: &[ReferenceVertexSet]) -> Result<Self, AlignError> {
        if references.iter().all(ReferenceVertexSet::is_empty) {
            return Err(AlignError::EmptyReference);
        }

        let mut mapping = Self::default();
        for set in references.iter().filter(|s| !s.is_empty()) {
            mapping.reference_sets += 1;
            for (v, vertex) in set.vertices.iter().enumerate() {
                mapping.insert(vertex_label(set.index, v + 1), *vertex, set.index);
            }
        }
        Ok(mapping)
    }

    fn insert(&mut self, label: String, position: Point2D, reference_index: usize) {
        let label = normalize_label(&label);
        if let Some(&slot) = self.index.get(&label) {
            // Last write wins; the label keeps its original slot.
            self.points[slot].position = position;
            self.collisions += 1;
            self.record(AlignWarning::LabelCollision {
                label,
                reference_index,
            });
            return;
        }
        self.index.insert(label.clone(), self.points.len());
        self.points.push(LabeledIdealPoint { label, position });
    }

    /// Move ideal vertices onto nearby annotation texts.
    ///
    /// Annotations are processed in input order and each one sees the
    /// positions left by the previous ones. On an exact distance tie the
    /// label inserted first wins.
    pub fn refine_with_annotations(&mut self, annotations: &[AnnotationText], threshold: f64) {
        for (k, text) in annotations.iter().enumerate() {
            match self.nearest(&text.position) {
                Some((slot, d)) if d < threshold => {
                    let point = &mut self.points[slot];
                    debug!(
                        "annotation #{k} {:?} refines {} (distance {d:.3})",
                        text.content, point.label
                    );
                    point.position = text.position;
                    self.associations.push(AnnotationAssociation {
                        annotation: k,
                        content: text.content.clone(),
                        label: point.label.clone(),
                        distance: d,
                    });
                }
                nearest => {
                    let (nearest_label, nearest_distance) = match nearest {
                        Some((slot, d)) => (Some(self.points[slot].label.clone()), Some(d)),
                        None => (None, None),
                    };
                    self.record(AlignWarning::UnassociatedAnnotation {
                        index: k,
                        content: text.content.clone(),
                        nearest_label,
                        nearest_distance,
                    });
                }
            }
        }
    }

    fn nearest(&self, target: &Point2D) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (slot, point) in self.points.iter().enumerate() {
            let d = distance(&point.position, target);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((slot, d));
            }
        }
        best
    }

    fn record(&mut self, warning: AlignWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Look up a label; the query is normalized first.
    pub fn get(&self, label: &str) -> Option<&LabeledIdealPoint> {
        self.index
            .get(&normalize_label(label))
            .map(|&slot| &self.points[slot])
    }

    pub fn position(&self, label: &str) -> Option<Point2D> {
        self.get(label).map(|p| p.position)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledIdealPoint> {
        self.points.iter()
    }

    pub fn associations(&self) -> &[AnnotationAssociation] {
        &self.associations
    }

    pub fn warnings(&self) -> &[AlignWarning] {
        &self.warnings
    }

    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            reference_sets: self.reference_sets,
            ideal_points: self.points.len(),
            label_collisions: self.collisions,
            annotations_associated: self.associations.len(),
            annotations_unassociated: self
                .warnings
                .iter()
                .filter(|w| matches!(w, AlignWarning::UnassociatedAnnotation { .. }))
                .count(),
        }
    }
}

/// Build the label -> ideal position mapping and refine it with annotations.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(references, annotations, params),
        fields(references = references.len(), annotations = annotations.len())
    )
)]
pub fn build_ideal_mapping(
    references: &[ReferenceVertexSet],
    annotations: &[AnnotationText],
    params: &MappingParams,
) -> Result<IdealMapping, AlignError> {
    let mut mapping = IdealMapping::from_references(references)?;
    mapping.refine_with_annotations(annotations, params.annotation_threshold);
    Ok(mapping)
}
