use chrono::{Datelike, NaiveDate};
use tracing::warn;

use super::super::domain::{
    Attachments, DegreeLevel, Document, Evidenced, LanguageLevel, OwnerType, PersonSnapshot,
};
use super::config::RankingPolicy;
use super::PointComponent;

/// Facts the rank table is checked against.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EvidenceSignals {
    pub highest_degree: Option<DegreeLevel>,
    pub best_language: Option<LanguageLevel>,
    pub teacher_evaluation: Option<f64>,
    pub total_points: u32,
    pub tenure_years: u32,
}

/// True when at least one document backing the claim is `Approved`.
///
/// The only gate deciding whether a claim counts as evidence.
pub fn has_approved_document<C>(claim: &Evidenced<C>) -> bool {
    claim
        .attachments
        .documents()
        .iter()
        .any(Document::is_approved)
}

/// Completed years between two dates; zero when `end` is not after `start`.
pub fn whole_years_between(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    let mut years = end.year() - start.year();
    if (end.month(), end.day()) < (start.month(), start.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

fn same_institution(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn approved_claims<'a, C>(
    owner_type: OwnerType,
    claims: &'a [Evidenced<C>],
) -> impl Iterator<Item = &'a Evidenced<C>> + 'a
where
    C: 'a,
{
    claims.iter().filter(move |claim| {
        if let Attachments::Unavailable { reason } = &claim.attachments {
            warn!(
                owner_type = owner_type.label(),
                owner_id = claim.owner_id.0,
                %reason,
                "excluding claim whose documents could not be loaded"
            );
        }
        has_approved_document(claim)
    })
}

pub(crate) fn score_snapshot(
    snapshot: &PersonSnapshot,
    policy: &RankingPolicy,
    tenure_years: u32,
) -> (Vec<PointComponent>, u32, EvidenceSignals) {
    let mut components = Vec::new();
    let mut total_points: u32 = 0;

    for production in approved_claims(OwnerType::AcademicProduction, &snapshot.productions) {
        let venue = production.claim.venue_id;
        let component = match policy.venues.classify(venue) {
            Some(rule) => PointComponent {
                source: OwnerType::AcademicProduction,
                owner_id: production.owner_id,
                points: rule.points,
                notes: format!("venue {} in tier '{}'", venue.0, rule.tier.label()),
            },
            None => PointComponent {
                source: OwnerType::AcademicProduction,
                owner_id: production.owner_id,
                points: 0,
                notes: format!("venue {} is unclassified", venue.0),
            },
        };
        total_points = total_points.saturating_add(component.points);
        components.push(component);
    }

    for experience in approved_claims(OwnerType::Experience, &snapshot.experiences) {
        if !same_institution(&experience.claim.institution, &policy.home_institution) {
            continue;
        }
        let component = match experience.claim.end_date {
            Some(end_date) => {
                let years = whole_years_between(experience.claim.start_date, end_date);
                PointComponent {
                    source: OwnerType::Experience,
                    owner_id: experience.owner_id,
                    points: years,
                    notes: format!(
                        "{years} year(s) as {} at the home institution",
                        experience.claim.position
                    ),
                }
            }
            None => PointComponent {
                source: OwnerType::Experience,
                owner_id: experience.owner_id,
                points: 0,
                notes: "ongoing position counts once it has an end date".to_string(),
            },
        };
        total_points = total_points.saturating_add(component.points);
        components.push(component);
    }

    let highest_degree = approved_claims(OwnerType::Study, &snapshot.studies)
        .map(|study| study.claim.degree)
        .max();

    let best_language = approved_claims(OwnerType::Language, &snapshot.languages)
        .map(|language| language.claim.level)
        .max();

    let signals = EvidenceSignals {
        highest_degree,
        best_language,
        teacher_evaluation: snapshot.teacher_evaluation,
        total_points,
        tenure_years,
    };

    (components, total_points, signals)
}
