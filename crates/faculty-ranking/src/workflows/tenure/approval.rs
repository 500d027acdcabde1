use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{
    Document, DocumentId, DocumentState, OwnerType, PersonId, Transition, Verdict,
};
use super::repository::{EvidenceStore, PersonTransaction, StoreError};

/// Documents moved by one bulk transition, grouped by owner type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub transition: Transition,
    pub moved: BTreeMap<OwnerType, usize>,
}

impl TransitionReport {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            moved: BTreeMap::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.moved.values().sum()
    }
}

/// Error raised while transitioning document state.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("document {document} cannot move from {from:?} via {transition:?}")]
    InvalidTransition {
        document: DocumentId,
        from: DocumentState,
        transition: Transition,
    },
}

/// Stateless driver for document lifecycle transitions.
///
/// Bulk operations walk [`OwnerType::ALL`] inside a single unit of work, so either every
/// eligible document moves or none does.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalStateMachine;

impl ApprovalStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Move every `Pending` document the person owns to `Approved`.
    pub fn approve_all_for_person<S>(
        &self,
        store: &S,
        person: &PersonId,
    ) -> Result<TransitionReport, ApprovalError>
    where
        S: EvidenceStore,
    {
        let report = store.with_person_transaction(person, |tx| self.approve_all_in(tx))?;
        info!(person = %person, approved = report.total(), "approved pending evidence");
        Ok(report)
    }

    /// Move every `Approved` document the person owns back to `Pending`.
    pub fn revert_all_for_person<S>(
        &self,
        store: &S,
        person: &PersonId,
    ) -> Result<TransitionReport, ApprovalError>
    where
        S: EvidenceStore,
    {
        let report = store.with_person_transaction(person, |tx| self.revert_all_in(tx))?;
        info!(person = %person, reverted = report.total(), "reverted approved evidence");
        Ok(report)
    }

    /// Bulk approval inside a caller-owned unit of work.
    pub fn approve_all_in(
        &self,
        tx: &mut dyn PersonTransaction,
    ) -> Result<TransitionReport, StoreError> {
        apply_bulk(tx, Transition::BulkApprove)
    }

    /// Bulk reversion inside a caller-owned unit of work.
    pub fn revert_all_in(
        &self,
        tx: &mut dyn PersonTransaction,
    ) -> Result<TransitionReport, StoreError> {
        apply_bulk(tx, Transition::BulkRevert)
    }

    /// Single reviewer decision on a `Pending` document.
    pub fn review_document<S>(
        &self,
        store: &S,
        person: &PersonId,
        document: DocumentId,
        verdict: Verdict,
    ) -> Result<Document, ApprovalError>
    where
        S: EvidenceStore,
    {
        // The inner result carries rule violations; only store failures abort the unit of work.
        let reviewed = store.with_person_transaction(person, |tx| {
            Ok(self.review_in(tx, document, verdict))
        })??;
        info!(
            person = %person,
            document = %reviewed.id,
            state = reviewed.state.label(),
            "recorded review decision"
        );
        Ok(reviewed)
    }

    pub fn review_in(
        &self,
        tx: &mut dyn PersonTransaction,
        document: DocumentId,
        verdict: Verdict,
    ) -> Result<Document, ApprovalError> {
        let mut current = tx.document(document)?;
        let transition = Transition::Review(verdict);
        let target =
            current
                .state
                .apply(transition)
                .ok_or(ApprovalError::InvalidTransition {
                    document,
                    from: current.state,
                    transition,
                })?;
        tx.set_document_state(document, target)?;
        current.state = target;
        Ok(current)
    }
}

fn apply_bulk(
    tx: &mut dyn PersonTransaction,
    transition: Transition,
) -> Result<TransitionReport, StoreError> {
    let mut report = TransitionReport::new(transition);
    for owner_type in OwnerType::ALL {
        for document in tx.documents(owner_type)? {
            let Some(target) = document.state.apply(transition) else {
                continue;
            };
            tx.set_document_state(document.id, target)?;
            *report.moved.entry(owner_type).or_default() += 1;
        }
        debug!(
            person = %tx.person(),
            owner_type = owner_type.label(),
            moved = report.moved.get(&owner_type).copied().unwrap_or(0),
            "bulk transition pass"
        );
    }
    Ok(report)
}
