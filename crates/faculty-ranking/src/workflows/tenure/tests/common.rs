use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::workflows::tenure::domain::{
    AcademicProduction, Attachments, ClaimDetail, Contract, ContractType, DegreeLevel, Document,
    DocumentId, DocumentState, Evidenced, Experience, LanguageCredential, LanguageLevel, OwnerId,
    OwnerRef, OwnerType, PersonId, PersonRole, PersonSnapshot, Study, SupportingRecord, VenueId,
};
use crate::workflows::tenure::evaluation::{EvaluationEngine, RankingPolicy};
use crate::workflows::tenure::memory::{MemoryEvidenceStore, MemoryRoleDirectory};
use crate::workflows::tenure::repository::{
    EvidenceStore, PersonTransaction, RoleDirectory, RoleError, ScoreRecord, StoreError,
};
use crate::workflows::tenure::service::TenureService;

pub(super) const HOME: &str = "Universidad Regional del Norte";

pub(super) fn person() -> PersonId {
    PersonId("p-0042".to_string())
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn as_of() -> NaiveDate {
    date(2025, 6, 30)
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(RankingPolicy::standard())
}

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

fn evidenced<C>(owner_type: OwnerType, claim: C, states: &[DocumentState]) -> Evidenced<C> {
    let owner = OwnerRef {
        owner_type,
        owner_id: OwnerId(next_id()),
    };
    let documents = states
        .iter()
        .map(|state| Document {
            id: DocumentId(next_id()),
            owner,
            state: *state,
            storage_key: format!("{}/{}.pdf", owner_type.label(), owner.owner_id.0),
        })
        .collect();
    Evidenced {
        owner_id: owner.owner_id,
        claim,
        attachments: Attachments::Loaded(documents),
    }
}

pub(super) fn study(degree: DegreeLevel, states: &[DocumentState]) -> Evidenced<Study> {
    evidenced(
        OwnerType::Study,
        Study {
            title: format!("{} programme", degree.label()),
            institution: "Universidad Nacional".to_string(),
            degree,
        },
        states,
    )
}

pub(super) fn language(
    level: LanguageLevel,
    states: &[DocumentState],
) -> Evidenced<LanguageCredential> {
    evidenced(
        OwnerType::Language,
        LanguageCredential {
            language: "English".to_string(),
            level,
        },
        states,
    )
}

pub(super) fn production(venue: u32, states: &[DocumentState]) -> Evidenced<AcademicProduction> {
    evidenced(
        OwnerType::AcademicProduction,
        AcademicProduction {
            title: format!("Article in venue {venue}"),
            venue_id: VenueId(venue),
        },
        states,
    )
}

pub(super) fn experience(
    institution: &str,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    states: &[DocumentState],
) -> Evidenced<Experience> {
    evidenced(
        OwnerType::Experience,
        Experience {
            institution: institution.to_string(),
            position: "Lecturer".to_string(),
            start_date,
            end_date,
        },
        states,
    )
}

pub(super) fn tenured_since(start_date: NaiveDate) -> Contract {
    Contract {
        person_id: person(),
        contract_type: ContractType::Tenured,
        start_date,
        end_date: None,
    }
}

/// Approved doctorate, B2, evaluation 4.5, 65 points and 9 years of tenure as of [`as_of`].
pub(super) fn titular_snapshot() -> PersonSnapshot {
    use DocumentState::Approved;

    let mut snapshot = PersonSnapshot::empty(person());
    snapshot.contract = Some(tenured_since(date(2016, 6, 30)));
    snapshot.teacher_evaluation = Some(4.5);
    snapshot.studies.push(study(DegreeLevel::Doctorate, &[Approved]));
    snapshot.languages.push(language(LanguageLevel::B2, &[Approved]));
    for venue in [101, 102, 103, 104, 105, 101] {
        snapshot.productions.push(production(venue, &[Approved]));
    }
    snapshot.experiences.push(experience(
        HOME,
        date(2010, 1, 15),
        Some(date(2015, 3, 1)),
        &[Approved],
    ));
    snapshot
}

/// Seed one claim per owner type, each carrying documents in the given states.
pub(super) fn seed_all_owner_types(
    store: &impl EvidenceStore,
    states: &[DocumentState],
) -> Vec<DocumentId> {
    let details = vec![
        ClaimDetail::Study(study(DegreeLevel::Doctorate, &[]).claim),
        ClaimDetail::Experience(experience(HOME, date(2012, 1, 1), None, &[]).claim),
        ClaimDetail::Language(language(LanguageLevel::B2, &[]).claim),
        ClaimDetail::AcademicProduction(production(101, &[]).claim),
        ClaimDetail::Supporting {
            record: SupportingRecord::Identification,
        },
        ClaimDetail::Supporting {
            record: SupportingRecord::Contact,
        },
        ClaimDetail::Supporting {
            record: SupportingRecord::TaxRecord,
        },
        ClaimDetail::Supporting {
            record: SupportingRecord::HealthAffiliation,
        },
        ClaimDetail::Supporting {
            record: SupportingRecord::ProfilePhoto,
        },
    ];

    store
        .with_person_transaction(&person(), |tx| {
            let mut ids = Vec::new();
            for detail in details {
                let owner = tx.add_claim(detail)?;
                for (index, state) in states.iter().enumerate() {
                    let id = tx.attach_document(owner, format!("seed/{index}.pdf"))?;
                    tx.set_document_state(id, *state)?;
                    ids.push(id);
                }
            }
            Ok(ids)
        })
        .expect("seed data stored")
}

/// Store wrapper whose units of work fail after a fixed number of state writes.
pub(super) struct FlakyStore {
    pub(super) inner: MemoryEvidenceStore,
    pub(super) writes_before_failure: usize,
}

impl FlakyStore {
    pub(super) fn failing_after(writes_before_failure: usize) -> Self {
        Self {
            inner: MemoryEvidenceStore::new(),
            writes_before_failure,
        }
    }
}

struct FlakyTransaction<'a> {
    inner: &'a mut dyn PersonTransaction,
    remaining: usize,
}

impl PersonTransaction for FlakyTransaction<'_> {
    fn person(&self) -> &PersonId {
        self.inner.person()
    }

    fn documents(&self, owner_type: OwnerType) -> Result<Vec<Document>, StoreError> {
        self.inner.documents(owner_type)
    }

    fn document(&self, id: DocumentId) -> Result<Document, StoreError> {
        self.inner.document(id)
    }

    fn set_document_state(
        &mut self,
        id: DocumentId,
        state: DocumentState,
    ) -> Result<(), StoreError> {
        if self.remaining == 0 {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        self.remaining -= 1;
        self.inner.set_document_state(id, state)
    }

    fn add_claim(&mut self, detail: ClaimDetail) -> Result<OwnerRef, StoreError> {
        self.inner.add_claim(detail)
    }

    fn attach_document(
        &mut self,
        owner: OwnerRef,
        storage_key: String,
    ) -> Result<DocumentId, StoreError> {
        self.inner.attach_document(owner, storage_key)
    }

    fn remove_claim(&mut self, owner: OwnerRef) -> Result<(), StoreError> {
        self.inner.remove_claim(owner)
    }

    fn contract(&self) -> Result<Option<Contract>, StoreError> {
        self.inner.contract()
    }

    fn replace_contract(
        &mut self,
        contract: Option<Contract>,
    ) -> Result<Option<Contract>, StoreError> {
        self.inner.replace_contract(contract)
    }

    fn set_teacher_evaluation(&mut self, average: Option<f64>) -> Result<(), StoreError> {
        self.inner.set_teacher_evaluation(average)
    }
}

impl EvidenceStore for FlakyStore {
    fn with_person_transaction<T, F>(&self, person: &PersonId, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn PersonTransaction) -> Result<T, StoreError>,
    {
        let remaining = self.writes_before_failure;
        self.inner.with_person_transaction(person, move |tx| {
            let mut flaky = FlakyTransaction { inner: tx, remaining };
            work(&mut flaky)
        })
    }

    fn snapshot(&self, person: &PersonId) -> Result<PersonSnapshot, StoreError> {
        self.inner.snapshot(person)
    }

    fn save_score(&self, score: ScoreRecord) -> Result<(), StoreError> {
        self.inner.save_score(score)
    }

    fn latest_score(&self, person: &PersonId) -> Result<Option<ScoreRecord>, StoreError> {
        self.inner.latest_score(person)
    }
}

pub(super) struct OfflineRoles;

impl RoleDirectory for OfflineRoles {
    fn assign(&self, _person: &PersonId, _role: PersonRole) -> Result<(), RoleError> {
        Err(RoleError::Unavailable("directory offline".to_string()))
    }
}

pub(super) fn service() -> (
    TenureService<MemoryEvidenceStore, MemoryRoleDirectory>,
    Arc<MemoryEvidenceStore>,
    Arc<MemoryRoleDirectory>,
) {
    let store = Arc::new(MemoryEvidenceStore::new());
    let roles = Arc::new(MemoryRoleDirectory::default());
    let service = TenureService::new(store.clone(), roles.clone(), RankingPolicy::standard());
    (service, store, roles)
}
