use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use super::common::{person, seed_all_owner_types, FlakyStore};
use crate::workflows::tenure::approval::{ApprovalError, ApprovalStateMachine};
use crate::workflows::tenure::domain::{
    ClaimDetail, DocumentId, DocumentState, LanguageCredential, LanguageLevel, OwnerType,
    PersonId, Transition, Verdict,
};
use crate::workflows::tenure::memory::MemoryEvidenceStore;
use crate::workflows::tenure::repository::{EvidenceStore, StoreError};

use DocumentState::{Approved, Pending, Rejected};

fn states_of(store: &MemoryEvidenceStore) -> BTreeMap<DocumentId, DocumentState> {
    store.document_states(&person()).expect("states load")
}

#[test]
fn bulk_approve_touches_every_owner_type() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Pending, Pending]);

    let report = ApprovalStateMachine::new()
        .approve_all_for_person(&store, &person())
        .expect("approval succeeds");

    assert_eq!(report.transition, Transition::BulkApprove);
    assert_eq!(report.total(), OwnerType::ALL.len() * 2);
    for owner_type in OwnerType::ALL {
        assert_eq!(report.moved.get(&owner_type), Some(&2), "{}", owner_type.label());
    }
    assert!(states_of(&store).values().all(|state| *state == Approved));
}

#[test]
fn bulk_approve_is_idempotent() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Pending, Approved, Rejected]);
    let machine = ApprovalStateMachine::new();

    machine
        .approve_all_for_person(&store, &person())
        .expect("first approval");
    let after_first = states_of(&store);
    let second = machine
        .approve_all_for_person(&store, &person())
        .expect("second approval");

    assert_eq!(second.total(), 0);
    assert_eq!(states_of(&store), after_first);
}

#[test]
fn bulk_revert_is_idempotent() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Approved, Rejected]);
    let machine = ApprovalStateMachine::new();

    machine
        .revert_all_for_person(&store, &person())
        .expect("first revert");
    let after_first = states_of(&store);
    let second = machine
        .revert_all_for_person(&store, &person())
        .expect("second revert");

    assert_eq!(second.total(), 0);
    assert_eq!(states_of(&store), after_first);
}

#[test]
fn approve_then_revert_restores_pending_documents() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Pending, Pending, Rejected]);
    let before = states_of(&store);
    let machine = ApprovalStateMachine::new();

    machine
        .approve_all_for_person(&store, &person())
        .expect("approval succeeds");
    machine
        .revert_all_for_person(&store, &person())
        .expect("revert succeeds");

    assert_eq!(states_of(&store), before);
}

#[test]
fn rejected_documents_survive_bulk_transitions() {
    let store = MemoryEvidenceStore::new();
    let ids = seed_all_owner_types(&store, &[Rejected]);
    let machine = ApprovalStateMachine::new();

    let approved = machine
        .approve_all_for_person(&store, &person())
        .expect("approval succeeds");
    let reverted = machine
        .revert_all_for_person(&store, &person())
        .expect("revert succeeds");

    assert_eq!(approved.total(), 0);
    assert_eq!(reverted.total(), 0);
    let states = states_of(&store);
    assert!(ids.iter().all(|id| states[id] == Rejected));
}

#[test]
fn failure_mid_batch_leaves_every_document_untouched() {
    let store = FlakyStore::failing_after(5);
    seed_all_owner_types(&store.inner, &[Pending]);
    let before = store.inner.document_states(&person()).expect("states load");

    let result = ApprovalStateMachine::new().approve_all_for_person(&store, &person());

    assert!(matches!(
        result,
        Err(ApprovalError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(
        store.inner.document_states(&person()).expect("states load"),
        before
    );
}

#[test]
fn review_moves_pending_to_a_final_verdict() {
    let store = MemoryEvidenceStore::new();
    let ids = seed_all_owner_types(&store, &[Pending]);
    let machine = ApprovalStateMachine::new();

    let rejected = machine
        .review_document(&store, &person(), ids[0], Verdict::Reject)
        .expect("review succeeds");
    let approved = machine
        .review_document(&store, &person(), ids[1], Verdict::Approve)
        .expect("review succeeds");

    assert_eq!(rejected.state, Rejected);
    assert_eq!(approved.state, Approved);
    let states = states_of(&store);
    assert_eq!(states[&ids[0]], Rejected);
    assert_eq!(states[&ids[1]], Approved);
}

#[test]
fn review_of_a_decided_document_is_refused() {
    let store = MemoryEvidenceStore::new();
    let ids = seed_all_owner_types(&store, &[Rejected]);

    let result =
        ApprovalStateMachine::new().review_document(&store, &person(), ids[0], Verdict::Approve);

    match result {
        Err(ApprovalError::InvalidTransition {
            document,
            from,
            transition,
        }) => {
            assert_eq!(document, ids[0]);
            assert_eq!(from, Rejected);
            assert_eq!(transition, Transition::Review(Verdict::Approve));
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }
    assert_eq!(states_of(&store)[&ids[0]], Rejected);
}

#[test]
fn review_of_unknown_document_is_not_found() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Pending]);

    let result = ApprovalStateMachine::new().review_document(
        &store,
        &person(),
        DocumentId(u64::MAX),
        Verdict::Approve,
    );

    assert!(matches!(
        result,
        Err(ApprovalError::Store(StoreError::NotFound(_)))
    ));
}

#[test]
fn bulk_transitions_only_touch_the_named_person() {
    let store = MemoryEvidenceStore::new();
    seed_all_owner_types(&store, &[Pending]);
    let other = PersonId("p-0099".to_string());
    store
        .with_person_transaction(&other, |tx| {
            let owner = tx.add_claim(ClaimDetail::Language(LanguageCredential {
                language: "French".to_string(),
                level: LanguageLevel::B1,
            }))?;
            tx.attach_document(owner, "fr.pdf".to_string())
        })
        .expect("other person seeded");

    ApprovalStateMachine::new()
        .approve_all_for_person(&store, &person())
        .expect("approval succeeds");

    let untouched = store.document_states(&other).expect("states load");
    assert!(untouched.values().all(|state| *state == Pending));
}

#[test]
fn concurrent_bulk_transitions_never_expose_a_mixed_state() {
    let store = Arc::new(MemoryEvidenceStore::new());
    seed_all_owner_types(&*store, &[Pending, Pending, Pending]);

    let writers: Vec<_> = (0..6)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let machine = ApprovalStateMachine::new();
                for round in 0..25 {
                    let result = if (worker + round) % 2 == 0 {
                        machine.approve_all_for_person(&*store, &person())
                    } else {
                        machine.revert_all_for_person(&*store, &person())
                    };
                    result.expect("transition succeeds");
                }
            })
        })
        .collect();

    let reader = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..200 {
                let snapshot = store.snapshot(&person()).expect("snapshot loads");
                let mut states = snapshot
                    .studies
                    .iter()
                    .flat_map(|claim| claim.attachments.documents())
                    .chain(
                        snapshot
                            .languages
                            .iter()
                            .flat_map(|claim| claim.attachments.documents()),
                    )
                    .map(|document| document.state);
                let first = states.next().expect("seeded documents");
                assert!(states.all(|state| state == first), "torn snapshot");
            }
        })
    };

    for writer in writers {
        writer.join().expect("writer thread");
    }
    reader.join().expect("reader thread");

    let states = states_of(&store);
    let first = *states.values().next().expect("seeded documents");
    assert!(states.values().all(|state| *state == first));
}
