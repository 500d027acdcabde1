use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for a person tracked by the records system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub String);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a claim record, unique within its owner type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub u64);

/// Identifier of a single uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{:06}", self.0)
    }
}

/// Closed set of record kinds that may own supporting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Study,
    Experience,
    Language,
    AcademicProduction,
    Identification,
    Contact,
    TaxRecord,
    HealthAffiliation,
    ProfilePhoto,
}

impl OwnerType {
    /// Every owner type, walked by bulk transitions and snapshot assembly.
    pub const ALL: [OwnerType; 9] = [
        OwnerType::Study,
        OwnerType::Experience,
        OwnerType::Language,
        OwnerType::AcademicProduction,
        OwnerType::Identification,
        OwnerType::Contact,
        OwnerType::TaxRecord,
        OwnerType::HealthAffiliation,
        OwnerType::ProfilePhoto,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            OwnerType::Study => "study",
            OwnerType::Experience => "experience",
            OwnerType::Language => "language",
            OwnerType::AcademicProduction => "academic_production",
            OwnerType::Identification => "identification",
            OwnerType::Contact => "contact",
            OwnerType::TaxRecord => "tax_record",
            OwnerType::HealthAffiliation => "health_affiliation",
            OwnerType::ProfilePhoto => "profile_photo",
        }
    }

    /// Whether claims of this type feed the tenure evaluation.
    pub const fn is_evaluated(self) -> bool {
        matches!(
            self,
            OwnerType::Study
                | OwnerType::Experience
                | OwnerType::Language
                | OwnerType::AcademicProduction
        )
    }
}

/// Generic `(owner_type, owner_id)` reference linking a document to its claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerRef {
    pub owner_type: OwnerType,
    pub owner_id: OwnerId,
}

/// Lifecycle state of a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentState {
    Pending,
    Approved,
    Rejected,
}

/// Outcome chosen by an individual reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approve,
    Reject,
}

/// Events that may move a document between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    BulkApprove,
    BulkRevert,
    Review(Verdict),
}

impl DocumentState {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentState::Pending => "pending",
            DocumentState::Approved => "approved",
            DocumentState::Rejected => "rejected",
        }
    }

    /// Target state for `transition`, or `None` when the transition does not apply.
    ///
    /// `Rejected` accepts nothing: retrying requires a new document.
    pub const fn apply(self, transition: Transition) -> Option<DocumentState> {
        match (self, transition) {
            (DocumentState::Pending, Transition::BulkApprove) => Some(DocumentState::Approved),
            (DocumentState::Approved, Transition::BulkRevert) => Some(DocumentState::Pending),
            (DocumentState::Pending, Transition::Review(Verdict::Approve)) => {
                Some(DocumentState::Approved)
            }
            (DocumentState::Pending, Transition::Review(Verdict::Reject)) => {
                Some(DocumentState::Rejected)
            }
            _ => None,
        }
    }
}

/// Uploaded evidence attached to exactly one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub owner: OwnerRef,
    pub state: DocumentState,
    /// Opaque pointer owned by the file-storage collaborator.
    pub storage_key: String,
}

impl Document {
    pub fn is_approved(&self) -> bool {
        self.state == DocumentState::Approved
    }
}

/// Formal education levels, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    Technical,
    Technological,
    Undergraduate,
    Specialization,
    /// Maestría.
    Masters,
    Doctorate,
}

impl DegreeLevel {
    pub const fn label(self) -> &'static str {
        match self {
            DegreeLevel::Technical => "technical",
            DegreeLevel::Technological => "technological",
            DegreeLevel::Undergraduate => "undergraduate",
            DegreeLevel::Specialization => "specialization",
            DegreeLevel::Masters => "masters",
            DegreeLevel::Doctorate => "doctorate",
        }
    }
}

/// CEFR proficiency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
    pub title: String,
    pub institution: String,
    pub degree: DegreeLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub institution: String,
    pub position: String,
    pub start_date: NaiveDate,
    /// `None` while the position is ongoing.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCredential {
    pub language: String,
    pub level: LanguageLevel,
}

/// Publication venue identifier as catalogued by the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicProduction {
    pub title: String,
    pub venue_id: VenueId,
}

/// Owner records that carry documents but never feed the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportingRecord {
    Identification,
    Contact,
    TaxRecord,
    HealthAffiliation,
    ProfilePhoto,
}

/// Typed payload of a claim record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimDetail {
    Study(Study),
    Experience(Experience),
    Language(LanguageCredential),
    AcademicProduction(AcademicProduction),
    Supporting { record: SupportingRecord },
}

impl ClaimDetail {
    pub const fn owner_type(&self) -> OwnerType {
        match self {
            ClaimDetail::Study(_) => OwnerType::Study,
            ClaimDetail::Experience(_) => OwnerType::Experience,
            ClaimDetail::Language(_) => OwnerType::Language,
            ClaimDetail::AcademicProduction(_) => OwnerType::AcademicProduction,
            ClaimDetail::Supporting { record } => match record {
                SupportingRecord::Identification => OwnerType::Identification,
                SupportingRecord::Contact => OwnerType::Contact,
                SupportingRecord::TaxRecord => OwnerType::TaxRecord,
                SupportingRecord::HealthAffiliation => OwnerType::HealthAffiliation,
                SupportingRecord::ProfilePhoto => OwnerType::ProfilePhoto,
            },
        }
    }
}

/// A stored claim owned by one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub owner: OwnerRef,
    pub person_id: PersonId,
    pub detail: ClaimDetail,
}

/// Closed set of contract kinds offered by the institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Tenure-track staff ("planta"); the only kind evaluated for rank.
    Tenured,
    FixedTerm,
    Adjunct,
    ServiceProvision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub person_id: PersonId,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    /// `None` while the contract is ongoing.
    pub end_date: Option<NaiveDate>,
}

/// Documents attached to a claim, as loaded for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attachments {
    Loaded(Vec<Document>),
    /// The claim references documents that could not be read.
    Unavailable { reason: String },
}

impl Attachments {
    pub fn documents(&self) -> &[Document] {
        match self {
            Attachments::Loaded(documents) => documents,
            Attachments::Unavailable { .. } => &[],
        }
    }
}

/// A claim together with the documents backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidenced<C> {
    pub owner_id: OwnerId,
    pub claim: C,
    pub attachments: Attachments,
}

/// Consistent, point-in-time view of everything the evaluation reads for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSnapshot {
    pub person_id: PersonId,
    #[serde(default)]
    pub contract: Option<Contract>,
    /// Teacher-assessment average, owned by an external evaluation process.
    #[serde(default)]
    pub teacher_evaluation: Option<f64>,
    #[serde(default)]
    pub studies: Vec<Evidenced<Study>>,
    #[serde(default)]
    pub experiences: Vec<Evidenced<Experience>>,
    #[serde(default)]
    pub languages: Vec<Evidenced<LanguageCredential>>,
    #[serde(default)]
    pub productions: Vec<Evidenced<AcademicProduction>>,
}

impl PersonSnapshot {
    pub fn empty(person_id: PersonId) -> Self {
        Self {
            person_id,
            contract: None,
            teacher_evaluation: None,
            studies: Vec::new(),
            experiences: Vec::new(),
            languages: Vec::new(),
            productions: Vec::new(),
        }
    }
}

/// Ordered academic ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Auxiliar,
    Asistente,
    Asociado,
    Titular,
}

impl Rank {
    pub const fn label(self) -> &'static str {
        match self {
            Rank::Auxiliar => "auxiliar",
            Rank::Asistente => "asistente",
            Rank::Asociado => "asociado",
            Rank::Titular => "titular",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named criteria a rank may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Education,
    Language,
    Evaluation,
    Points,
    Years,
}

impl Requirement {
    pub const fn label(self) -> &'static str {
        match self {
            Requirement::Education => "education",
            Requirement::Language => "language",
            Requirement::Evaluation => "evaluation",
            Requirement::Points => "points",
            Requirement::Years => "years",
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role a person holds in the surrounding system. Owned by the role directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Aspirante,
    Docente,
}

impl PersonRole {
    pub const fn label(self) -> &'static str {
        match self {
            PersonRole::Aspirante => "aspirante",
            PersonRole::Docente => "docente",
        }
    }
}
