use nalgebra::{Matrix2, Vector2};

use crate::{CorrespondencePair, Point2D, RigidTransform};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors returned by the rigid solver.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("not enough correspondences to solve (got {got}, need {required})")]
    InsufficientData { got: usize, required: usize },
    #[error("point set length mismatch (real={real}, ideal={ideal})")]
    LengthMismatch { real: usize, ideal: usize },
    #[error("singular value decomposition failed")]
    SvdFailed,
}

/// Least-squares rigid transform mapping every `pair.real` onto `pair.ideal`.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(pairs), fields(n = pairs.len())))]
pub fn solve(pairs: &[CorrespondencePair]) -> Result<RigidTransform, SolveError> {
    let (real, ideal): (Vec<Point2D>, Vec<Point2D>) =
        pairs.iter().map(|pair| (pair.real, pair.ideal)).unzip();
    solve_points(&real, &ideal)
}

/// Kabsch alignment `ideal[i] ~ R * real[i] + t` with `det(R) = +1`.
pub fn solve_points(real: &[Point2D], ideal: &[Point2D]) -> Result<RigidTransform, SolveError> {
    if real.len() != ideal.len() {
        return Err(SolveError::LengthMismatch {
            real: real.len(),
            ideal: ideal.len(),
        });
    }
    if real.is_empty() {
        return Err(SolveError::InsufficientData {
            got: 0,
            required: 1,
        });
    }

    let c_real = centroid(real);
    let c_ideal = centroid(ideal);

    // H = sum over pairs of ideal_c * real_c^T
    let mut h = Matrix2::<f64>::zeros();
    for (r, i) in real.iter().zip(ideal) {
        let rc = r.coords - c_real;
        let ic = i.coords - c_ideal;
        h += ic * rc.transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(SolveError::SvdFailed)?;
    let mut v_t = svd.v_t.ok_or(SolveError::SvdFailed)?;

    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        // Flip the axis of the smallest singular value to undo the mirror.
        let last = v_t.nrows() - 1;
        v_t.row_mut(last).neg_mut();
        rotation = u * v_t;
    }

    let translation = c_ideal - rotation * c_real;
    Ok(RigidTransform::new(rotation, translation))
}

fn centroid(points: &[Point2D]) -> Vector2<f64> {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    sum / points.len() as f64
}
