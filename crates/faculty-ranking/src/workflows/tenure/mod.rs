//! Document approval and faculty tenure evaluation.
//!
//! Contract lifecycle events drive bulk document transitions through the
//! [`ApprovalStateMachine`]; the [`EvaluationEngine`] then classifies a person from a
//! consistent snapshot of their approved evidence against a declarative [`RankingPolicy`].

pub mod approval;
pub mod domain;
pub mod evaluation;
pub mod memory;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use approval::{ApprovalError, ApprovalStateMachine, TransitionReport};
pub use domain::{
    AcademicProduction, Attachments, ClaimDetail, ClaimRecord, Contract, ContractType,
    DegreeLevel, Document, DocumentId, DocumentState, Evidenced, Experience, LanguageCredential,
    LanguageLevel, OwnerId, OwnerRef, OwnerType, PersonId, PersonRole, PersonSnapshot, Rank,
    Requirement, Study, SupportingRecord, Transition, VenueId, Verdict,
};
pub use evaluation::{
    has_approved_document, whole_years_between, EvaluationEngine, EvaluationResult,
    PointComponent, PolicyError, RankRequirements, RankingPolicy, TierRule, VenueClassification,
    VenueTier, NOT_ELIGIBLE,
};
pub use memory::{MemoryEvidenceStore, MemoryRoleDirectory};
pub use repository::{
    EvidenceStore, PersonTransaction, RoleDirectory, RoleError, ScoreRecord, StoreError,
};
pub use service::{SubmittedClaim, TenureService, TenureServiceError};
