use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::approval::{ApprovalError, ApprovalStateMachine, TransitionReport};
use super::domain::{
    ClaimDetail, Contract, Document, DocumentId, OwnerRef, PersonId, PersonRole, Verdict,
};
use super::evaluation::{EvaluationEngine, RankingPolicy};
use super::repository::{EvidenceStore, RoleDirectory, RoleError, ScoreRecord, StoreError};

/// Claim stored by [`TenureService::submit_claim`] with its freshly attached documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedClaim {
    pub owner: OwnerRef,
    pub documents: Vec<DocumentId>,
}

/// Contract lifecycle workflow composing the evidence store, approval machine, evaluation
/// engine and role directory.
pub struct TenureService<S, R> {
    store: Arc<S>,
    roles: Arc<R>,
    approvals: ApprovalStateMachine,
    engine: Arc<EvaluationEngine>,
}

impl<S, R> TenureService<S, R>
where
    S: EvidenceStore + 'static,
    R: RoleDirectory + 'static,
{
    pub fn new(store: Arc<S>, roles: Arc<R>, policy: RankingPolicy) -> Self {
        Self {
            store,
            roles,
            approvals: ApprovalStateMachine::new(),
            engine: Arc::new(EvaluationEngine::new(policy)),
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Store a claim and attach one `Pending` document per storage key.
    pub fn submit_claim(
        &self,
        person: &PersonId,
        detail: ClaimDetail,
        storage_keys: Vec<String>,
    ) -> Result<SubmittedClaim, TenureServiceError> {
        let submitted = self.store.with_person_transaction(person, |tx| {
            let owner = tx.add_claim(detail)?;
            let documents = storage_keys
                .into_iter()
                .map(|key| tx.attach_document(owner, key))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SubmittedClaim { owner, documents })
        })?;
        info!(
            person = %person,
            owner_type = submitted.owner.owner_type.label(),
            documents = submitted.documents.len(),
            "claim submitted"
        );
        Ok(submitted)
    }

    /// Attach a new submission to an existing claim, e.g. after a rejection.
    pub fn resubmit_document(
        &self,
        person: &PersonId,
        owner: OwnerRef,
        storage_key: String,
    ) -> Result<DocumentId, TenureServiceError> {
        let document = self
            .store
            .with_person_transaction(person, |tx| tx.attach_document(owner, storage_key))?;
        Ok(document)
    }

    pub fn remove_claim(
        &self,
        person: &PersonId,
        owner: OwnerRef,
    ) -> Result<(), TenureServiceError> {
        self.store
            .with_person_transaction(person, |tx| tx.remove_claim(owner))?;
        info!(person = %person, owner_type = owner.owner_type.label(), "claim removed");
        Ok(())
    }

    pub fn record_teacher_evaluation(
        &self,
        person: &PersonId,
        average: Option<f64>,
    ) -> Result<(), TenureServiceError> {
        self.store
            .with_person_transaction(person, |tx| tx.set_teacher_evaluation(average))?;
        Ok(())
    }

    /// Create the contract and approve all pending evidence as one unit of work, then
    /// promote the person to `Docente`.
    pub fn hire(&self, contract: Contract) -> Result<TransitionReport, TenureServiceError> {
        let person = contract.person_id.clone();
        let report = self.store.with_person_transaction(&person, |tx| {
            if let Some(existing) = tx.contract()? {
                return Err(StoreError::Conflict(format!(
                    "{} already holds a {:?} contract since {}",
                    existing.person_id, existing.contract_type, existing.start_date
                )));
            }
            tx.replace_contract(Some(contract))?;
            self.approvals.approve_all_in(tx)
        })?;

        self.roles.assign(&person, PersonRole::Docente)?;
        info!(person = %person, approved = report.total(), "contract created");
        Ok(report)
    }

    /// Delete the contract and revert approved evidence as one unit of work, then demote
    /// the person to `Aspirante`.
    pub fn terminate(&self, person: &PersonId) -> Result<TransitionReport, TenureServiceError> {
        let report = self.store.with_person_transaction(person, |tx| {
            if tx.replace_contract(None)?.is_none() {
                return Err(StoreError::NotFound(format!("active contract for {person}")));
            }
            self.approvals.revert_all_in(tx)
        })?;

        self.roles.assign(person, PersonRole::Aspirante)?;
        info!(person = %person, reverted = report.total(), "contract deleted");
        Ok(report)
    }

    pub fn review_document(
        &self,
        person: &PersonId,
        document: DocumentId,
        verdict: Verdict,
    ) -> Result<Document, TenureServiceError> {
        let reviewed = self
            .approvals
            .review_document(&*self.store, person, document, verdict)?;
        Ok(reviewed)
    }

    /// Evaluate from a consistent snapshot and persist the resulting score.
    pub fn evaluate(
        &self,
        person: &PersonId,
        as_of: NaiveDate,
    ) -> Result<ScoreRecord, TenureServiceError> {
        let snapshot = self.store.snapshot(person)?;
        let result = self.engine.evaluate(&snapshot, as_of);
        let record = ScoreRecord {
            person_id: person.clone(),
            evaluated_on: as_of,
            result,
        };
        self.store.save_score(record.clone())?;
        info!(person = %person, summary = %record.summary(), "score recorded");
        Ok(record)
    }

    pub fn latest_score(
        &self,
        person: &PersonId,
    ) -> Result<Option<ScoreRecord>, TenureServiceError> {
        Ok(self.store.latest_score(person)?)
    }
}

/// Error raised by the tenure workflow.
#[derive(Debug, thiserror::Error)]
pub enum TenureServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Approval(#[from] ApprovalError),
    #[error(transparent)]
    Role(#[from] RoleError),
}
