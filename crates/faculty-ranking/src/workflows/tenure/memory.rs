use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::domain::{
    Attachments, ClaimDetail, ClaimRecord, Contract, Document, DocumentId, DocumentState,
    Evidenced, OwnerId, OwnerRef, OwnerType, PersonId, PersonRole, PersonSnapshot,
};
use super::repository::{
    EvidenceStore, PersonTransaction, RoleDirectory, RoleError, ScoreRecord, StoreError,
};

/// Everything stored for one person. Cloned wholesale to stage a unit of work.
#[derive(Debug, Clone, Default)]
struct PersonLedger {
    claims: BTreeMap<OwnerRef, ClaimRecord>,
    documents: BTreeMap<DocumentId, Document>,
    contract: Option<Contract>,
    teacher_evaluation: Option<f64>,
    scores: Vec<ScoreRecord>,
}

impl PersonLedger {
    fn snapshot(&self, person: &PersonId) -> PersonSnapshot {
        let mut attached: BTreeMap<OwnerRef, Vec<Document>> = BTreeMap::new();
        for document in self.documents.values() {
            attached
                .entry(document.owner)
                .or_default()
                .push(document.clone());
        }

        let mut snapshot = PersonSnapshot::empty(person.clone());
        snapshot.contract = self.contract.clone();
        snapshot.teacher_evaluation = self.teacher_evaluation;

        for (owner, record) in &self.claims {
            let attachments = Attachments::Loaded(attached.remove(owner).unwrap_or_default());
            let owner_id = owner.owner_id;
            match &record.detail {
                ClaimDetail::Study(study) => snapshot.studies.push(Evidenced {
                    owner_id,
                    claim: study.clone(),
                    attachments,
                }),
                ClaimDetail::Experience(experience) => snapshot.experiences.push(Evidenced {
                    owner_id,
                    claim: experience.clone(),
                    attachments,
                }),
                ClaimDetail::Language(language) => snapshot.languages.push(Evidenced {
                    owner_id,
                    claim: language.clone(),
                    attachments,
                }),
                ClaimDetail::AcademicProduction(production) => {
                    snapshot.productions.push(Evidenced {
                        owner_id,
                        claim: production.clone(),
                        attachments,
                    })
                }
                ClaimDetail::Supporting { .. } => {}
            }
        }

        snapshot
    }
}

/// In-process evidence store with one lock per person.
///
/// A unit of work clones the person's ledger, applies its writes to the copy and swaps the
/// copy in only on success, so a failed batch leaves no trace.
#[derive(Debug)]
pub struct MemoryEvidenceStore {
    people: Mutex<HashMap<PersonId, Arc<Mutex<PersonLedger>>>>,
    owner_sequence: AtomicU64,
    document_sequence: AtomicU64,
}

impl Default for MemoryEvidenceStore {
    fn default() -> Self {
        Self {
            people: Mutex::new(HashMap::new()),
            owner_sequence: AtomicU64::new(1),
            document_sequence: AtomicU64::new(1),
        }
    }
}

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

impl MemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ledger(&self, person: &PersonId) -> Result<Arc<Mutex<PersonLedger>>, StoreError> {
        let mut people = self.people.lock().map_err(|_| poisoned("person index"))?;
        Ok(people.entry(person.clone()).or_default().clone())
    }

    fn existing_ledger(
        &self,
        person: &PersonId,
    ) -> Result<Option<Arc<Mutex<PersonLedger>>>, StoreError> {
        let people = self.people.lock().map_err(|_| poisoned("person index"))?;
        Ok(people.get(person).cloned())
    }

    /// Current state of every document the person owns, keyed by document id.
    pub fn document_states(
        &self,
        person: &PersonId,
    ) -> Result<BTreeMap<DocumentId, DocumentState>, StoreError> {
        let Some(ledger) = self.existing_ledger(person)? else {
            return Ok(BTreeMap::new());
        };
        let guard = ledger.lock().map_err(|_| poisoned("person ledger"))?;
        Ok(guard
            .documents
            .iter()
            .map(|(id, document)| (*id, document.state))
            .collect())
    }
}

impl EvidenceStore for MemoryEvidenceStore {
    fn with_person_transaction<T, F>(&self, person: &PersonId, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn PersonTransaction) -> Result<T, StoreError>,
    {
        let ledger = self.ledger(person)?;
        let mut committed = ledger.lock().map_err(|_| poisoned("person ledger"))?;
        let mut staged = committed.clone();

        let output = {
            let mut transaction = MemoryTransaction {
                person,
                ledger: &mut staged,
                owner_sequence: &self.owner_sequence,
                document_sequence: &self.document_sequence,
            };
            work(&mut transaction)?
        };

        *committed = staged;
        Ok(output)
    }

    fn snapshot(&self, person: &PersonId) -> Result<PersonSnapshot, StoreError> {
        let Some(ledger) = self.existing_ledger(person)? else {
            return Ok(PersonSnapshot::empty(person.clone()));
        };
        let guard = ledger.lock().map_err(|_| poisoned("person ledger"))?;
        Ok(guard.snapshot(person))
    }

    fn save_score(&self, score: ScoreRecord) -> Result<(), StoreError> {
        let ledger = self.ledger(&score.person_id)?;
        let mut guard = ledger.lock().map_err(|_| poisoned("person ledger"))?;
        guard.scores.push(score);
        Ok(())
    }

    fn latest_score(&self, person: &PersonId) -> Result<Option<ScoreRecord>, StoreError> {
        let Some(ledger) = self.existing_ledger(person)? else {
            return Ok(None);
        };
        let guard = ledger.lock().map_err(|_| poisoned("person ledger"))?;
        Ok(guard.scores.last().cloned())
    }
}

struct MemoryTransaction<'a> {
    person: &'a PersonId,
    ledger: &'a mut PersonLedger,
    owner_sequence: &'a AtomicU64,
    document_sequence: &'a AtomicU64,
}

fn describe(owner: OwnerRef) -> String {
    format!("{} #{}", owner.owner_type.label(), owner.owner_id.0)
}

impl PersonTransaction for MemoryTransaction<'_> {
    fn person(&self) -> &PersonId {
        self.person
    }

    fn documents(&self, owner_type: OwnerType) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .ledger
            .documents
            .values()
            .filter(|document| document.owner.owner_type == owner_type)
            .cloned()
            .collect())
    }

    fn document(&self, id: DocumentId) -> Result<Document, StoreError> {
        self.ledger
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn set_document_state(
        &mut self,
        id: DocumentId,
        state: DocumentState,
    ) -> Result<(), StoreError> {
        let document = self
            .ledger
            .documents
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        document.state = state;
        Ok(())
    }

    fn add_claim(&mut self, detail: ClaimDetail) -> Result<OwnerRef, StoreError> {
        let owner = OwnerRef {
            owner_type: detail.owner_type(),
            owner_id: OwnerId(self.owner_sequence.fetch_add(1, Ordering::Relaxed)),
        };
        self.ledger.claims.insert(
            owner,
            ClaimRecord {
                owner,
                person_id: self.person.clone(),
                detail,
            },
        );
        Ok(owner)
    }

    fn attach_document(
        &mut self,
        owner: OwnerRef,
        storage_key: String,
    ) -> Result<DocumentId, StoreError> {
        if !self.ledger.claims.contains_key(&owner) {
            return Err(StoreError::NotFound(describe(owner)));
        }
        let id = DocumentId(self.document_sequence.fetch_add(1, Ordering::Relaxed));
        self.ledger.documents.insert(
            id,
            Document {
                id,
                owner,
                state: DocumentState::Pending,
                storage_key,
            },
        );
        Ok(id)
    }

    fn remove_claim(&mut self, owner: OwnerRef) -> Result<(), StoreError> {
        if self.ledger.claims.remove(&owner).is_none() {
            return Err(StoreError::NotFound(describe(owner)));
        }
        self.ledger
            .documents
            .retain(|_, document| document.owner != owner);
        Ok(())
    }

    fn contract(&self) -> Result<Option<Contract>, StoreError> {
        Ok(self.ledger.contract.clone())
    }

    fn replace_contract(
        &mut self,
        contract: Option<Contract>,
    ) -> Result<Option<Contract>, StoreError> {
        Ok(std::mem::replace(&mut self.ledger.contract, contract))
    }

    fn set_teacher_evaluation(&mut self, average: Option<f64>) -> Result<(), StoreError> {
        self.ledger.teacher_evaluation = average;
        Ok(())
    }
}

/// In-process role assignments for the console and tests.
#[derive(Debug, Default)]
pub struct MemoryRoleDirectory {
    roles: Mutex<HashMap<PersonId, PersonRole>>,
}

impl MemoryRoleDirectory {
    pub fn role_of(&self, person: &PersonId) -> Option<PersonRole> {
        self.roles
            .lock()
            .ok()
            .and_then(|roles| roles.get(person).copied())
    }
}

impl RoleDirectory for MemoryRoleDirectory {
    fn assign(&self, person: &PersonId, role: PersonRole) -> Result<(), RoleError> {
        let mut roles = self
            .roles
            .lock()
            .map_err(|_| RoleError::Unavailable("role lock poisoned".to_string()))?;
        roles.insert(person.clone(), role);
        Ok(())
    }
}
