use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, Months, NaiveDate};
use clap::Args;
use faculty_ranking::error::AppError;
use faculty_ranking::workflows::tenure::{
    AcademicProduction, ClaimDetail, Contract, ContractType, DegreeLevel, DocumentId,
    DocumentState, Experience, LanguageCredential, LanguageLevel, MemoryEvidenceStore,
    MemoryRoleDirectory, PersonId, RankingPolicy, ScoreRecord, Study, SupportingRecord,
    TenureService, TenureServiceError, VenueId, Verdict,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = crate::cli::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Years of tenure to simulate before the evaluation date
    #[arg(long, default_value_t = 9)]
    pub(crate) tenure_years: u32,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            as_of: None,
            tenure_years: 9,
        }
    }
}

#[derive(Debug, Serialize)]
struct DemoStep {
    step: &'static str,
    role: Option<&'static str>,
    documents: BTreeMap<String, &'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<ScoreRecord>,
}

type DemoService = TenureService<MemoryEvidenceStore, MemoryRoleDirectory>;

pub(crate) fn run_demo(policy: RankingPolicy, args: DemoArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let hired_on = as_of
        .checked_sub_months(Months::new(12 * args.tenure_years))
        .unwrap_or(as_of);
    let home_institution = policy.home_institution.clone();

    let store = Arc::new(MemoryEvidenceStore::new());
    let roles = Arc::new(MemoryRoleDirectory::default());
    let service = TenureService::new(store.clone(), roles.clone(), policy);
    let person = PersonId("docente-001".to_string());

    let doctorate = ClaimDetail::Study(Study {
        title: "PhD in Materials Engineering".to_string(),
        institution: "Universidad Nacional".to_string(),
        degree: DegreeLevel::Doctorate,
    });
    service.submit_claim(
        &person,
        doctorate,
        vec![
            "studies/phd-diploma.pdf".to_string(),
            "studies/phd-transcript.pdf".to_string(),
        ],
    )?;

    let language = ClaimDetail::Language(LanguageCredential {
        language: "English".to_string(),
        level: LanguageLevel::B2,
    });
    service.submit_claim(&person, language, vec!["languages/ielts.pdf".to_string()])?;

    let productions = [
        ("Thermal fatigue in alloys", 101),
        ("Lab notes on sintering", 301),
    ];
    for (title, venue) in productions {
        let production = ClaimDetail::AcademicProduction(AcademicProduction {
            title: title.to_string(),
            venue_id: VenueId(venue),
        });
        service.submit_claim(&person, production, vec![format!("production/{venue}.pdf")])?;
    }

    let experience = ClaimDetail::Experience(Experience {
        institution: home_institution,
        position: "Adjunct lecturer".to_string(),
        start_date: NaiveDate::from_ymd_opt(2008, 2, 1).unwrap_or(hired_on),
        end_date: NaiveDate::from_ymd_opt(2014, 6, 30),
    });
    service.submit_claim(
        &person,
        experience,
        vec!["experience/certificate.pdf".to_string()],
    )?;

    let identification = ClaimDetail::Supporting {
        record: SupportingRecord::Identification,
    };
    let id_card =
        service.submit_claim(&person, identification, vec!["id/front.png".to_string()])?;
    if let Some(document) = id_card.documents.first() {
        service.review_document(&person, *document, Verdict::Reject)?;
    }

    service.record_teacher_evaluation(&person, Some(4.5))?;

    let mut steps = vec![step(&store, &roles, &person, "submitted", None)?];
    steps.push(evaluated(
        &service,
        &store,
        &roles,
        &person,
        as_of,
        "evaluated before hiring",
    )?);

    service.hire(Contract {
        person_id: person.clone(),
        contract_type: ContractType::Tenured,
        start_date: hired_on,
        end_date: None,
    })?;
    steps.push(evaluated(&service, &store, &roles, &person, as_of, "hired")?);

    service.terminate(&person)?;
    steps.push(evaluated(
        &service, &store, &roles, &person, as_of, "terminated",
    )?);

    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}

fn evaluated(
    service: &DemoService,
    store: &MemoryEvidenceStore,
    roles: &MemoryRoleDirectory,
    person: &PersonId,
    as_of: NaiveDate,
    label: &'static str,
) -> Result<DemoStep, AppError> {
    let score = service.evaluate(person, as_of)?;
    step(store, roles, person, label, Some(score))
}

fn step(
    store: &MemoryEvidenceStore,
    roles: &MemoryRoleDirectory,
    person: &PersonId,
    label: &'static str,
    score: Option<ScoreRecord>,
) -> Result<DemoStep, AppError> {
    let documents = store
        .document_states(person)
        .map_err(TenureServiceError::from)?
        .into_iter()
        .map(|(id, state): (DocumentId, DocumentState)| (id.to_string(), state.label()))
        .collect();

    Ok(DemoStep {
        step: label,
        role: roles.role_of(person).map(|role| role.label()),
        documents,
        score,
    })
}
