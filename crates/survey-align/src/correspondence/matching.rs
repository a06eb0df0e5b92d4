use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};
use survey_align_core::{CorrespondencePair, SurveyedPoint};

use super::{normalize_label, IdealMapping};
use crate::{AlignError, AlignWarning};

/// A surveyed point whose label found no ideal vertex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedSurvey {
    pub id: u32,
    /// Normalized label (empty when the point carried none).
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub surveyed: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unmatched_labels: usize,
}

/// Pairs produced by label matching plus the points left over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrespondenceSet {
    /// One pair per matched surveyed point, in surveyed order.
    pub pairs: Vec<CorrespondencePair>,
    pub unmatched: Vec<UnmatchedSurvey>,
}

impl CorrespondenceSet {
    /// Pair every surveyed point whose label exists in `mapping`.
    ///
    /// Never fails; use [`match_correspondences`] to reject an empty result.
    pub fn build(surveyed: &[SurveyedPoint], mapping: &IdealMapping) -> Self {
        let mut set = Self::default();
        for point in surveyed {
            let label = normalize_label(&point.label);
            let ideal = (!label.is_empty())
                .then(|| mapping.position(&label))
                .flatten();
            match ideal {
                Some(ideal) => set.pairs.push(CorrespondencePair::new(
                    point.id,
                    label,
                    point.position,
                    ideal,
                )),
                None => set.unmatched.push(UnmatchedSurvey {
                    id: point.id,
                    label,
                }),
            }
        }
        debug!(
            "matched {} of {} surveyed points ({} unmatched)",
            set.pairs.len(),
            surveyed.len(),
            set.unmatched.len()
        );
        set
    }

    /// Distinct labels that failed to match.
    pub fn unmatched_labels(&self) -> BTreeSet<String> {
        self.unmatched.iter().map(|u| u.label.clone()).collect()
    }

    /// One [`AlignWarning::UnmatchedLabel`] per unmatched surveyed point.
    pub fn warnings(&self) -> Vec<AlignWarning> {
        self.unmatched
            .iter()
            .map(|u| AlignWarning::UnmatchedLabel {
                survey_id: u.id,
                label: u.label.clone(),
            })
            .collect()
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            surveyed: self.pairs.len() + self.unmatched.len(),
            matched: self.pairs.len(),
            unmatched: self.unmatched.len(),
            unmatched_labels: self.unmatched_labels().len(),
        }
    }
}

/// Pair surveyed points with ideal positions by normalized label.
///
/// Fails with [`AlignError::NoCorrespondence`] when nothing matched.
pub fn match_correspondences(
    surveyed: &[SurveyedPoint],
    mapping: &IdealMapping,
) -> Result<CorrespondenceSet, AlignError> {
    let set = CorrespondenceSet::build(surveyed, mapping);
    if set.pairs.is_empty() {
        return Err(AlignError::NoCorrespondence {
            surveyed: surveyed.len(),
        });
    }
    Ok(set)
}
