use log::{debug, warn};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use survey_align_core::{distance, solve_points, CorrespondencePair, Point2D, RigidTransform};

use crate::OutlierFilterParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Pairs needed to determine a 2D rigid motion.
const MIN_RIGID_SAMPLES: usize = 2;

/// Sample points closer than this are treated as coincident.
const DEGENERATE_EPS: f64 = 1e-9;

/// Non-fatal conditions under which the filter passes its input through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterWarning {
    /// Fewer pairs than one minimal sample; filtering was skipped.
    InsufficientSamples { pairs: usize, min_samples: usize },
    /// No trial produced a usable consensus set.
    NoConsensus { trials: usize },
}

/// Counts describing one filter run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub input: usize,
    pub inliers: usize,
    pub outliers: usize,
    pub trials: usize,
    /// `false` when the input was passed through unchanged.
    pub applied: bool,
}

/// Result of [`filter_outliers`].
#[derive(Clone, Debug)]
pub struct FilterOutcome {
    /// Retained pairs, in input order.
    pub inliers: Vec<CorrespondencePair>,
    /// `inlier_mask[i]` tells whether input pair `i` was retained.
    pub inlier_mask: Vec<bool>,
    /// Model of the winning trial, if any.
    pub model: Option<RigidTransform>,
    pub trials: usize,
    pub warning: Option<FilterWarning>,
}

impl FilterOutcome {
    fn passthrough(pairs: &[CorrespondencePair], trials: usize, warning: FilterWarning) -> Self {
        Self {
            inliers: pairs.to_vec(),
            inlier_mask: vec![true; pairs.len()],
            model: None,
            trials,
            warning: Some(warning),
        }
    }

    pub fn outlier_count(&self) -> usize {
        self.inlier_mask.len() - self.inliers.len()
    }

    /// Input pairs rejected by the filter, in input order.
    pub fn outliers<'a>(
        &'a self,
        pairs: &'a [CorrespondencePair],
    ) -> impl Iterator<Item = &'a CorrespondencePair> + 'a {
        pairs
            .iter()
            .zip(&self.inlier_mask)
            .filter(|(_, keep)| !**keep)
            .map(|(pair, _)| pair)
    }

    pub fn summary(&self) -> FilterSummary {
        FilterSummary {
            input: self.inlier_mask.len(),
            inliers: self.inliers.len(),
            outliers: self.outlier_count(),
            trials: self.trials,
            applied: self.warning.is_none(),
        }
    }
}

struct Consensus {
    model: RigidTransform,
    mask: Vec<bool>,
    count: usize,
    sse: f64,
}

impl Consensus {
    fn evaluate(model: RigidTransform, pairs: &[CorrespondencePair], threshold: f64) -> Self {
        let mut mask = Vec::with_capacity(pairs.len());
        let mut count = 0;
        let mut sse = 0.0;
        for pair in pairs {
            let r = distance(&model.apply(&pair.real), &pair.ideal);
            let inlier = r <= threshold;
            if inlier {
                count += 1;
                sse += r * r;
            }
            mask.push(inlier);
        }
        Self {
            model,
            mask,
            count,
            sse,
        }
    }

    fn beats(&self, other: &Consensus) -> bool {
        self.count > other.count || (self.count == other.count && self.sse < other.sse)
    }
}

/// Drop correspondence pairs that disagree with the dominant rigid motion.
///
/// The output is always an order-preserving subset of `pairs`. When there are
/// too few pairs to sample, or no trial yields a consensus of at least one
/// minimal sample, the input is returned unchanged and
/// [`FilterOutcome::warning`] says why.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(pairs, params), fields(n = pairs.len()))
)]
pub fn filter_outliers(
    pairs: &[CorrespondencePair],
    params: &OutlierFilterParams,
) -> FilterOutcome {
    let n = pairs.len();
    let sample_size = params.min_samples.max(MIN_RIGID_SAMPLES);
    if n < sample_size {
        warn!("outlier filter skipped: {n} pairs, need at least {sample_size}");
        return FilterOutcome::passthrough(
            pairs,
            0,
            FilterWarning::InsufficientSamples {
                pairs: n,
                min_samples: sample_size,
            },
        );
    }

    let mut rng = match params.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };

    let mut best: Option<Consensus> = None;
    let mut sample_real: Vec<Point2D> = Vec::with_capacity(sample_size);
    let mut sample_ideal: Vec<Point2D> = Vec::with_capacity(sample_size);
    let mut max_trials = params.max_trials;
    let mut trials = 0;

    while trials < max_trials {
        trials += 1;

        sample_real.clear();
        sample_ideal.clear();
        for i in index::sample(&mut rng, n, sample_size) {
            sample_real.push(pairs[i].real);
            sample_ideal.push(pairs[i].ideal);
        }
        if has_coincident(&sample_real) || has_coincident(&sample_ideal) {
            continue;
        }

        let Ok(model) = solve_points(&sample_real, &sample_ideal) else {
            continue;
        };

        let candidate = Consensus::evaluate(model, pairs, params.residual_threshold);
        if best.as_ref().is_some_and(|b| !candidate.beats(b)) {
            continue;
        }

        let count = candidate.count;
        best = Some(candidate);
        if count == n {
            break;
        }
        max_trials = max_trials.min(dynamic_max_trials(
            count,
            n,
            sample_size,
            params.stop_probability,
        ));
    }

    match best {
        Some(best) if best.count >= sample_size => {
            let inliers: Vec<CorrespondencePair> = pairs
                .iter()
                .zip(&best.mask)
                .filter(|(_, keep)| **keep)
                .map(|(pair, _)| pair.clone())
                .collect();
            debug!(
                "outlier filter kept {}/{} pairs after {} trials",
                inliers.len(),
                n,
                trials
            );
            FilterOutcome {
                inliers,
                inlier_mask: best.mask,
                model: Some(best.model),
                trials,
                warning: None,
            }
        }
        _ => {
            warn!("outlier filter found no consensus in {trials} trials; keeping all {n} pairs");
            FilterOutcome::passthrough(pairs, trials, FilterWarning::NoConsensus { trials })
        }
    }
}

fn has_coincident(points: &[Point2D]) -> bool {
    points.iter().enumerate().any(|(i, p)| {
        points[i + 1..]
            .iter()
            .any(|q| distance(p, q) < DEGENERATE_EPS)
    })
}

/// Trials needed to draw one all-inlier sample with `probability`, given the
/// current inlier ratio.
fn dynamic_max_trials(inliers: usize, total: usize, sample_size: usize, probability: f64) -> usize {
    let nom = 1.0 - probability;
    if nom <= 0.0 {
        return usize::MAX;
    }
    let ratio = inliers as f64 / total as f64;
    let denom = 1.0 - ratio.powi(sample_size as i32);
    if denom >= 1.0 {
        return usize::MAX;
    }
    if denom <= 0.0 {
        return 1;
    }
    let trials = (nom.ln() / denom.ln()).ceil();
    if trials.is_finite() && trials >= 1.0 {
        trials as usize
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    fn pair(k: u32, real: (f64, f64), ideal: (f64, f64)) -> CorrespondencePair {
        CorrespondencePair::new(
            k,
            format!("V1-{}", k + 1),
            Point2D::new(real.0, real.1),
            Point2D::new(ideal.0, ideal.1),
        )
    }

    /// Eight clean pairs under a known motion plus two gross outliers.
    fn contaminated() -> Vec<CorrespondencePair> {
        let truth = RigidTransform::from_angle(0.35, Vector2::new(12.0, -4.0));
        let real = [
            (0.0, 0.0),
            (20.0, 0.0),
            (20.0, 15.0),
            (0.0, 15.0),
            (10.0, 7.5),
            (5.0, 12.0),
            (15.0, 3.0),
            (8.0, 1.0),
        ];
        let mut pairs: Vec<CorrespondencePair> = real
            .iter()
            .enumerate()
            .map(|(k, &(x, y))| {
                let ideal = truth.apply(&Point2D::new(x, y));
                pair(k as u32, (x, y), (ideal.x, ideal.y))
            })
            .collect();
        pairs.insert(3, pair(100, (60.0, -30.0), (1.0, 1.0)));
        pairs.push(pair(101, (-25.0, 40.0), (3.0, 9.0)));
        pairs
    }

    #[test]
    fn rejects_gross_outliers() {
        let pairs = contaminated();
        let params = OutlierFilterParams::default().with_seed(7);
        let out = filter_outliers(&pairs, &params);

        assert!(out.warning.is_none());
        assert_eq!(out.inliers.len(), 8);
        assert!(!out.inlier_mask[3]);
        assert!(!out.inlier_mask[9]);
        let rejected: Vec<u32> = out.outliers(&pairs).map(|p| p.survey_id).collect();
        assert_eq!(rejected, vec![100, 101]);

        let summary = out.summary();
        assert_eq!(summary.input, 10);
        assert_eq!(summary.outliers, 2);
        assert!(summary.applied);
        assert!(summary.trials >= 1 && summary.trials <= params.max_trials);
    }

    #[test]
    fn output_is_ordered_subset_of_input() {
        let pairs = contaminated();
        for seed in 0..20 {
            let params = OutlierFilterParams::default().with_seed(seed);
            let out = filter_outliers(&pairs, &params);
            assert_eq!(out.inlier_mask.len(), pairs.len());

            let mut cursor = 0;
            for kept in &out.inliers {
                let pos = pairs[cursor..]
                    .iter()
                    .position(|p| p == kept)
                    .expect("retained pair must come from the input");
                cursor += pos + 1;
            }
        }
    }

    #[test]
    fn same_seed_same_result() {
        let pairs = contaminated();
        let params = OutlierFilterParams::default().with_seed(42);
        let a = filter_outliers(&pairs, &params);
        let b = filter_outliers(&pairs, &params);
        assert_eq!(a.inlier_mask, b.inlier_mask);
        assert_eq!(a.trials, b.trials);
    }

    #[test]
    fn too_few_pairs_pass_through() {
        let pairs = vec![pair(0, (1.0, 1.0), (2.0, 2.0))];
        let out = filter_outliers(&pairs, &OutlierFilterParams::default());
        assert_eq!(out.inliers, pairs);
        assert_eq!(
            out.warning,
            Some(FilterWarning::InsufficientSamples {
                pairs: 1,
                min_samples: 2
            })
        );
        assert_eq!(out.trials, 0);
        assert!(!out.summary().applied);
    }

    #[test]
    fn min_samples_below_two_is_raised() {
        let pairs = vec![pair(0, (1.0, 1.0), (2.0, 2.0))];
        let params = OutlierFilterParams {
            min_samples: 1,
            ..OutlierFilterParams::default()
        };
        let out = filter_outliers(&pairs, &params);
        assert!(matches!(
            out.warning,
            Some(FilterWarning::InsufficientSamples { min_samples: 2, .. })
        ));
    }

    #[test]
    fn degenerate_input_falls_back_to_all_pairs() {
        let pairs = vec![
            pair(0, (5.0, 5.0), (1.0, 1.0)),
            pair(1, (5.0, 5.0), (2.0, 2.0)),
            pair(2, (5.0, 5.0), (3.0, 3.0)),
        ];
        let params = OutlierFilterParams::default().with_seed(3).with_max_trials(25);
        let out = filter_outliers(&pairs, &params);
        assert_eq!(out.inliers, pairs);
        assert_eq!(out.warning, Some(FilterWarning::NoConsensus { trials: 25 }));
        assert!(out.model.is_none());
    }

    #[test]
    fn clean_data_stops_on_full_consensus() {
        let pairs: Vec<CorrespondencePair> = (0..6)
            .map(|k| {
                let x = k as f64 * 3.0;
                let y = (k * k) as f64;
                pair(k, (x, y), (x + 1.0, y - 2.0))
            })
            .collect();
        let out = filter_outliers(&pairs, &OutlierFilterParams::default().with_seed(1));
        assert_eq!(out.inliers.len(), 6);
        assert_eq!(out.trials, 1);
    }

    #[test]
    fn dynamic_trials_shrink_with_inlier_ratio() {
        assert_eq!(dynamic_max_trials(0, 10, 2, 0.99), usize::MAX);
        assert_eq!(dynamic_max_trials(10, 10, 2, 0.99), 1);
        assert_eq!(dynamic_max_trials(5, 10, 2, 1.0), usize::MAX);
        // 0.75^2 inlier samples: ceil(ln 0.01 / ln 0.4375) = 6
        assert_eq!(dynamic_max_trials(3, 4, 2, 0.99), 6);
        assert!(dynamic_max_trials(8, 10, 2, 0.99) < dynamic_max_trials(5, 10, 2, 0.99));
    }
}
