use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    ClaimDetail, Contract, Document, DocumentId, DocumentState, OwnerRef, OwnerType,
    PersonId, PersonRole, PersonSnapshot,
};
use super::evaluation::EvaluationResult;

/// Persisted projection of an evaluation. Recomputable, never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub person_id: PersonId,
    pub evaluated_on: NaiveDate,
    pub result: EvaluationResult,
}

impl ScoreRecord {
    pub fn summary(&self) -> String {
        match self.result.achieved_rank {
            Some(rank) => format!(
                "{} as of {}: {} with {} point(s)",
                self.person_id, self.evaluated_on, rank, self.result.total_points
            ),
            None => format!(
                "{} as of {}: {}",
                self.person_id, self.evaluated_on, self.result.reason
            ),
        }
    }
}

/// Operations available inside one person's unit of work.
///
/// Every write becomes visible only if the enclosing
/// [`EvidenceStore::with_person_transaction`] call returns `Ok`.
pub trait PersonTransaction {
    fn person(&self) -> &PersonId;
    fn documents(&self, owner_type: OwnerType) -> Result<Vec<Document>, StoreError>;
    fn document(&self, id: DocumentId) -> Result<Document, StoreError>;
    fn set_document_state(&mut self, id: DocumentId, state: DocumentState)
        -> Result<(), StoreError>;
    fn add_claim(&mut self, detail: ClaimDetail) -> Result<OwnerRef, StoreError>;
    /// Attach a new `Pending` document to an existing claim.
    fn attach_document(
        &mut self,
        owner: OwnerRef,
        storage_key: String,
    ) -> Result<DocumentId, StoreError>;
    /// Delete a claim together with every document it owns.
    fn remove_claim(&mut self, owner: OwnerRef) -> Result<(), StoreError>;
    fn contract(&self) -> Result<Option<Contract>, StoreError>;
    /// Replace the active contract, returning the previous one.
    fn replace_contract(&mut self, contract: Option<Contract>)
        -> Result<Option<Contract>, StoreError>;
    fn set_teacher_evaluation(&mut self, average: Option<f64>) -> Result<(), StoreError>;
}

/// Persistence boundary consumed by the approval machine and the evaluation workflow.
pub trait EvidenceStore: Send + Sync {
    /// Run `work` in a serialized, all-or-nothing unit of work scoped to `person`.
    ///
    /// Units of work for the same person never interleave; an `Err` from `work` discards
    /// every write it made.
    fn with_person_transaction<T, F>(&self, person: &PersonId, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn PersonTransaction) -> Result<T, StoreError>;

    /// Read every evaluated claim and its documents as of one point in time.
    fn snapshot(&self, person: &PersonId) -> Result<PersonSnapshot, StoreError>;

    fn save_score(&self, score: ScoreRecord) -> Result<(), StoreError>;

    fn latest_score(&self, person: &PersonId) -> Result<Option<ScoreRecord>, StoreError>;
}

/// Externally owned role assignment (Aspirante / Docente).
///
/// Sequenced by the contract workflow after evidence transitions commit.
pub trait RoleDirectory: Send + Sync {
    fn assign(&self, person: &PersonId, role: PersonRole) -> Result<(), RoleError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Role directory failure.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("role directory unavailable: {0}")]
    Unavailable(String),
}
