use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::{Rank, Requirement};
use super::config::{RankRequirements, RankingPolicy};
use super::rules::EvidenceSignals;

/// How the achieved rank was reached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankDecision {
    pub rank: Rank,
    pub missing: BTreeMap<Rank, BTreeSet<Requirement>>,
    pub reason: String,
}

/// Requirements of `row` that the signals do not satisfy.
pub(crate) fn unmet_requirements(
    row: &RankRequirements,
    signals: &EvidenceSignals,
) -> BTreeSet<Requirement> {
    let mut unmet = BTreeSet::new();

    if signals
        .highest_degree
        .map(|degree| degree < row.min_education)
        .unwrap_or(true)
    {
        unmet.insert(Requirement::Education);
    }

    if signals
        .best_language
        .map(|level| level < row.min_language)
        .unwrap_or(true)
    {
        unmet.insert(Requirement::Language);
    }

    // A missing assessment never satisfies the threshold.
    if !signals
        .teacher_evaluation
        .map(|average| average >= row.min_evaluation)
        .unwrap_or(false)
    {
        unmet.insert(Requirement::Evaluation);
    }

    if signals.total_points < row.min_points {
        unmet.insert(Requirement::Points);
    }

    if signals.tenure_years < row.min_years {
        unmet.insert(Requirement::Years);
    }

    unmet
}

fn missing_for(
    above: Option<&RankRequirements>,
    signals: &EvidenceSignals,
) -> BTreeMap<Rank, BTreeSet<Requirement>> {
    let mut missing = BTreeMap::new();
    if let Some(row) = above {
        let unmet = unmet_requirements(row, signals);
        if !unmet.is_empty() {
            missing.insert(row.rank, unmet);
        }
    }
    missing
}

/// Walk the rank rows top-down.
///
/// A row is achieved when every requirement holds, or when its `guaranteed_by` degree is
/// held even though other requirements fail. Otherwise the policy's floor rank applies.
/// Only the guaranteed and floor paths report the unmet requirements of the row directly
/// above; a full match reports nothing.
pub(crate) fn decide_rank(policy: &RankingPolicy, signals: &EvidenceSignals) -> RankDecision {
    let mut above: Option<&RankRequirements> = None;

    for row in &policy.ranks {
        if unmet_requirements(row, signals).is_empty() {
            return RankDecision {
                rank: row.rank,
                missing: BTreeMap::new(),
                reason: format!("meets every {} requirement", row.rank),
            };
        }

        if let Some(degree) = row.guaranteed_by {
            if signals
                .highest_degree
                .map(|held| held >= degree)
                .unwrap_or(false)
            {
                return RankDecision {
                    rank: row.rank,
                    missing: missing_for(above, signals),
                    reason: format!("approved {} secures {}", degree.label(), row.rank),
                };
            }
        }

        above = Some(row);
    }

    let reason = match above {
        Some(row) => format!("does not meet the {} requirements", row.rank),
        None => "no rank requirements configured".to_string(),
    };

    RankDecision {
        rank: policy.floor_rank,
        missing: missing_for(above, signals),
        reason,
    }
}
