mod config;
mod policy;
mod rules;

pub use config::{
    PolicyError, RankRequirements, RankingPolicy, TierRule, VenueClassification, VenueTier,
};
pub use rules::{has_approved_document, whole_years_between};

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{OwnerId, OwnerType, PersonId, PersonSnapshot, Rank, Requirement};
use policy::decide_rank;

/// Reason recorded when the person holds no qualifying contract.
pub const NOT_ELIGIBLE: &str = "not eligible";

/// Stateless evaluator applying a ranking policy to a person snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    policy: RankingPolicy,
}

impl EvaluationEngine {
    pub fn new(policy: RankingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Classify the person as of `as_of`, which stands in for an ongoing contract's end.
    ///
    /// Pure: the same snapshot, date and policy always produce the same result.
    pub fn evaluate(&self, snapshot: &PersonSnapshot, as_of: NaiveDate) -> EvaluationResult {
        let contract = match &snapshot.contract {
            Some(contract) if contract.contract_type == self.policy.qualifying_contract => {
                contract
            }
            _ => {
                debug!(person = %snapshot.person_id, "no qualifying contract");
                return EvaluationResult::not_eligible(
                    snapshot.person_id.clone(),
                    &self.policy.version,
                );
            }
        };

        let tenure_years =
            whole_years_between(contract.start_date, contract.end_date.unwrap_or(as_of));
        let (components, total_points, signals) =
            rules::score_snapshot(snapshot, &self.policy, tenure_years);
        let decision = decide_rank(&self.policy, &signals);

        debug!(
            person = %snapshot.person_id,
            rank = decision.rank.label(),
            total_points,
            tenure_years,
            "evaluated tenure rank"
        );

        EvaluationResult {
            person_id: snapshot.person_id.clone(),
            achieved_rank: Some(decision.rank),
            total_points,
            tenure_years,
            missing_requirements: decision.missing,
            reason: decision.reason,
            components,
            policy_version: self.policy.version.clone(),
        }
    }
}

/// Point contribution of a single claim, kept for audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointComponent {
    pub source: OwnerType,
    pub owner_id: OwnerId,
    pub points: u32,
    pub notes: String,
}

/// Rank classification and merit score for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub person_id: PersonId,
    /// `None` when the person holds no qualifying contract.
    pub achieved_rank: Option<Rank>,
    pub total_points: u32,
    pub tenure_years: u32,
    /// Unmet requirements of the rank directly above the achieved one. Empty when the
    /// achieved rank's requirements are fully met.
    pub missing_requirements: BTreeMap<Rank, BTreeSet<Requirement>>,
    pub reason: String,
    pub components: Vec<PointComponent>,
    pub policy_version: String,
}

impl EvaluationResult {
    fn not_eligible(person_id: PersonId, policy_version: &str) -> Self {
        Self {
            person_id,
            achieved_rank: None,
            total_points: 0,
            tenure_years: 0,
            missing_requirements: BTreeMap::new(),
            reason: NOT_ELIGIBLE.to_string(),
            components: Vec::new(),
            policy_version: policy_version.to_string(),
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.achieved_rank.is_some()
    }

    /// Requirement names still missing for `rank`, or an empty list.
    pub fn missing_for(&self, rank: Rank) -> Vec<&'static str> {
        self.missing_requirements
            .get(&rank)
            .map(|unmet| unmet.iter().map(|requirement| requirement.label()).collect())
            .unwrap_or_default()
    }
}
