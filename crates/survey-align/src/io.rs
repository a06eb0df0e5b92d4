//! JSON input, configuration and report helpers for survey alignment.

use crate::correspondence::MappingParams;
use crate::{
    AlignInput, AlignParams, AlignWarning, AlignmentDiagnostics, AlignmentOutcome, RigidTransform,
    SurveyAligner,
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use survey_align_core::Point2D;

#[derive(thiserror::Error, Debug)]
pub enum AlignIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AlignInput {
    /// Load surveyed points, reference polylines and annotations from JSON.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this input to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Configuration for one alignment run from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignConfig {
    #[serde(default)]
    pub input_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub params: AlignParams,
}

impl AlignConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("survey_align_report.json"))
    }

    pub fn mapping_params(&self) -> &MappingParams {
        &self.params.mapping
    }

    /// Build an aligner from this config.
    pub fn build_aligner(&self) -> SurveyAligner {
        SurveyAligner::new(self.params.clone())
    }
}

/// Solved transform in report form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformReport {
    /// Row-major rotation matrix.
    pub rotation: [[f64; 2]; 2],
    pub translation: [f64; 2],
    pub angle_degrees: f64,
    pub determinant: f64,
}

impl From<&RigidTransform> for TransformReport {
    fn from(t: &RigidTransform) -> Self {
        Self {
            rotation: t.rotation_rows(),
            translation: [t.translation.x, t.translation.y],
            angle_degrees: t.angle().to_degrees(),
            determinant: t.determinant(),
        }
    }
}

/// A surveyed point after the transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedPoint {
    pub id: u32,
    pub label: String,
    pub original: Point2D,
    pub transformed: Point2D,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignReport {
    #[serde(default)]
    pub input_path: Option<String>,
    pub num_surveyed: usize,
    pub num_references: usize,
    pub num_annotations: usize,
    #[serde(default)]
    pub transform: Option<TransformReport>,
    #[serde(default)]
    pub points: Vec<TransformedPoint>,
    #[serde(default)]
    pub warnings: Vec<AlignWarning>,
    #[serde(default)]
    pub diagnostics: AlignmentDiagnostics,
    #[serde(default)]
    pub error: Option<String>,
}

impl AlignReport {
    /// Build a base report from the run input.
    pub fn new(input: &AlignInput, input_path: Option<&Path>) -> Self {
        Self {
            input_path: input_path.map(|p| p.to_string_lossy().into_owned()),
            num_surveyed: input.surveyed.len(),
            num_references: input.references.len(),
            num_annotations: input.annotations.len(),
            transform: None,
            points: Vec::new(),
            warnings: Vec::new(),
            diagnostics: AlignmentDiagnostics::default(),
            error: None,
        }
    }

    /// Populate report fields from a finished run.
    pub fn set_outcome(&mut self, input: &AlignInput, outcome: &AlignmentOutcome) {
        self.warnings = outcome.warnings().to_vec();
        self.diagnostics = *outcome.diagnostics();
        match outcome {
            AlignmentOutcome::Success(success) => {
                self.transform = Some(TransformReport::from(&success.transform));
                self.points = input
                    .surveyed
                    .iter()
                    .zip(&success.transformed_points)
                    .map(|(p, t)| TransformedPoint {
                        id: p.id,
                        label: p.label.clone(),
                        original: p.position,
                        transformed: *t,
                    })
                    .collect();
                self.error = None;
            }
            AlignmentOutcome::Failure(failure) => {
                self.transform = None;
                self.points.clear();
                self.error = Some(failure.reason.to_string());
            }
        }
    }

    pub fn from_outcome(
        input: &AlignInput,
        input_path: Option<&Path>,
        outcome: &AlignmentOutcome,
    ) -> Self {
        let mut report = Self::new(input, input_path);
        report.set_outcome(input, outcome);
        report
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.transform.is_some()
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, AlignIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AlignIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
