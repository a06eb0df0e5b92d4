use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::{distance, CorrespondencePair, Point2D};

/// Proper 2D rigid motion `dst = rotation * src + translation`.
///
/// Transforms produced by [`crate::solve`] always carry a rotation with
/// determinant `+1`; hand-built transforms are not validated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: Matrix2<f64>,
    pub translation: Vector2<f64>,
}

impl RigidTransform {
    pub fn new(rotation: Matrix2<f64>, translation: Vector2<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix2::identity(), Vector2::zeros())
    }

    /// Counter-clockwise rotation by `theta` radians followed by `translation`.
    pub fn from_angle(theta: f64, translation: Vector2<f64>) -> Self {
        let (s, c) = theta.sin_cos();
        Self::new(Matrix2::new(c, -s, s, c), translation)
    }

    /// Rotation angle in radians, in `(-pi, pi]`.
    #[inline]
    pub fn angle(&self) -> f64 {
        self.rotation[(1, 0)].atan2(self.rotation[(0, 0)])
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.rotation.determinant()
    }

    /// Row-major copy of the rotation matrix.
    pub fn rotation_rows(&self) -> [[f64; 2]; 2] {
        [
            [self.rotation[(0, 0)], self.rotation[(0, 1)]],
            [self.rotation[(1, 0)], self.rotation[(1, 1)]],
        ]
    }

    #[inline]
    pub fn apply(&self, p: &Point2D) -> Point2D {
        Point2D::from(self.rotation * p.coords + self.translation)
    }

    /// Apply to every point, preserving count and order.
    pub fn apply_all(&self, points: &[Point2D]) -> Vec<Point2D> {
        points.iter().map(|p| self.apply(p)).collect()
    }

    /// Inverse motion. Uses the transpose, so it assumes an orthonormal rotation.
    pub fn inverse(&self) -> Self {
        let rt = self.rotation.transpose();
        Self::new(rt, -(rt * self.translation))
    }

    /// `self` after `other`: `self.apply(&other.apply(p))`.
    pub fn compose(&self, other: &RigidTransform) -> Self {
        Self::new(
            self.rotation * other.rotation,
            self.rotation * other.translation + self.translation,
        )
    }

    /// Distance between the mapped real point and its ideal point, per pair.
    pub fn residuals(&self, pairs: &[CorrespondencePair]) -> Vec<f64> {
        pairs
            .iter()
            .map(|pair| distance(&self.apply(&pair.real), &pair.ideal))
            .collect()
    }

    /// Root-mean-square residual over `pairs`, `0.0` when empty.
    pub fn rms_error(&self, pairs: &[CorrespondencePair]) -> f64 {
        if pairs.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.residuals(pairs).iter().map(|r| r * r).sum();
        (sum / pairs.len() as f64).sqrt()
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}
