use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::{ContractType, DegreeLevel, LanguageLevel, Rank, VenueId};

/// Point tiers for academic production venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueTier {
    Top,
    A,
    B,
}

impl VenueTier {
    pub const fn label(self) -> &'static str {
        match self {
            VenueTier::Top => "top",
            VenueTier::A => "a",
            VenueTier::B => "b",
        }
    }
}

/// One tier of the venue classification: its point award and member venues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub tier: VenueTier,
    pub points: u32,
    pub venues: BTreeSet<VenueId>,
}

/// Venue → tier lookup table. Tiers must be disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueClassification {
    tiers: Vec<TierRule>,
}

impl VenueClassification {
    pub fn new(tiers: Vec<TierRule>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[TierRule] {
        &self.tiers
    }

    pub fn classify(&self, venue: VenueId) -> Option<&TierRule> {
        self.tiers.iter().find(|rule| rule.venues.contains(&venue))
    }

    /// Replace tier membership with `venue_id,tier` rows, keeping each tier's point award.
    pub fn reclassified_from_csv<R: Read>(&self, reader: R) -> Result<Self, PolicyError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut membership: BTreeMap<VenueTier, BTreeSet<VenueId>> = BTreeMap::new();
        for row in csv_reader.deserialize::<VenueRow>() {
            let row = row?;
            if !self.tiers.iter().any(|rule| rule.tier == row.tier) {
                return Err(PolicyError::Invalid(format!(
                    "venue {} assigned to unknown tier '{}'",
                    row.venue_id,
                    row.tier.label()
                )));
            }
            membership
                .entry(row.tier)
                .or_default()
                .insert(VenueId(row.venue_id));
        }

        let tiers = self
            .tiers
            .iter()
            .map(|rule| TierRule {
                tier: rule.tier,
                points: rule.points,
                venues: membership.remove(&rule.tier).unwrap_or_default(),
            })
            .collect();

        let classification = Self { tiers };
        classification.validate()?;
        Ok(classification)
    }

    pub fn reclassified_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Self, PolicyError> {
        let file = std::fs::File::open(path)?;
        self.reclassified_from_csv(file)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let mut seen_tiers = BTreeSet::new();
        let mut owner: BTreeMap<VenueId, VenueTier> = BTreeMap::new();
        for rule in &self.tiers {
            if !seen_tiers.insert(rule.tier) {
                return Err(PolicyError::Invalid(format!(
                    "tier '{}' declared more than once",
                    rule.tier.label()
                )));
            }
            for venue in &rule.venues {
                if let Some(previous) = owner.insert(*venue, rule.tier) {
                    return Err(PolicyError::Invalid(format!(
                        "venue {} classified as both '{}' and '{}'",
                        venue.0,
                        previous.label(),
                        rule.tier.label()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct VenueRow {
    venue_id: u32,
    tier: VenueTier,
}

/// Requirement row for one rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRequirements {
    pub rank: Rank,
    pub min_education: DegreeLevel,
    pub min_language: LanguageLevel,
    pub min_evaluation: f64,
    pub min_points: u32,
    pub min_years: u32,
    /// An approved degree at this level secures the rank even when other rows fail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guaranteed_by: Option<DegreeLevel>,
}

/// Versioned rank requirement table and venue classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPolicy {
    pub version: String,
    pub home_institution: String,
    pub qualifying_contract: ContractType,
    /// Rank assigned when no row in `ranks` is reached.
    pub floor_rank: Rank,
    /// Rank rows ordered from highest to lowest.
    pub ranks: Vec<RankRequirements>,
    pub venues: VenueClassification,
}

impl RankingPolicy {
    /// Institutional table in force since 2024.
    ///
    /// Venue ids mirror the legacy catalogue and still await review by the academic council.
    pub fn standard() -> Self {
        Self {
            version: "2024.1".to_string(),
            home_institution: "Universidad Regional del Norte".to_string(),
            qualifying_contract: ContractType::Tenured,
            floor_rank: Rank::Auxiliar,
            ranks: vec![
                RankRequirements {
                    rank: Rank::Titular,
                    min_education: DegreeLevel::Doctorate,
                    min_language: LanguageLevel::B2,
                    min_evaluation: 4.0,
                    min_points: 60,
                    min_years: 8,
                    guaranteed_by: None,
                },
                RankRequirements {
                    rank: Rank::Asociado,
                    min_education: DegreeLevel::Doctorate,
                    min_language: LanguageLevel::B2,
                    min_evaluation: 4.0,
                    min_points: 30,
                    min_years: 6,
                    guaranteed_by: Some(DegreeLevel::Doctorate),
                },
                RankRequirements {
                    rank: Rank::Asistente,
                    min_education: DegreeLevel::Masters,
                    min_language: LanguageLevel::B1,
                    min_evaluation: 4.0,
                    min_points: 20,
                    min_years: 4,
                    guaranteed_by: None,
                },
            ],
            venues: VenueClassification::new(vec![
                TierRule {
                    tier: VenueTier::Top,
                    points: 10,
                    venues: venue_set(&[101, 102, 103, 104, 105]),
                },
                TierRule {
                    tier: VenueTier::A,
                    points: 6,
                    venues: venue_set(&[201, 202, 203, 204, 205, 206, 207]),
                },
                TierRule {
                    tier: VenueTier::B,
                    points: 3,
                    venues: venue_set(&[301, 302, 303, 304, 305, 306, 307, 308]),
                },
            ]),
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_reader(reader)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(file)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.ranks.is_empty() {
            return Err(PolicyError::Invalid(
                "policy declares no rank requirements".to_string(),
            ));
        }
        if self.home_institution.trim().is_empty() {
            return Err(PolicyError::Invalid(
                "home institution must not be blank".to_string(),
            ));
        }

        for pair in self.ranks.windows(2) {
            if pair[0].rank <= pair[1].rank {
                return Err(PolicyError::Invalid(format!(
                    "rank rows must descend: {} listed before {}",
                    pair[0].rank, pair[1].rank
                )));
            }
        }

        for row in &self.ranks {
            if !row.min_evaluation.is_finite() {
                return Err(PolicyError::Invalid(format!(
                    "{} minimum evaluation must be a finite number",
                    row.rank
                )));
            }
            if row.rank <= self.floor_rank {
                return Err(PolicyError::Invalid(format!(
                    "{} is not above the floor rank {}",
                    row.rank, self.floor_rank
                )));
            }
        }

        self.venues.validate()
    }
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

fn venue_set(ids: &[u32]) -> BTreeSet<VenueId> {
    ids.iter().copied().map(VenueId).collect()
}

#[derive(Debug)]
pub enum PolicyError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyError::Io(err) => write!(f, "failed to read ranking policy: {}", err),
            PolicyError::Csv(err) => write!(f, "invalid venue classification CSV: {}", err),
            PolicyError::Json(err) => write!(f, "invalid ranking policy JSON: {}", err),
            PolicyError::Invalid(reason) => write!(f, "inconsistent ranking policy: {}", reason),
        }
    }
}

impl std::error::Error for PolicyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PolicyError::Io(err) => Some(err),
            PolicyError::Csv(err) => Some(err),
            PolicyError::Json(err) => Some(err),
            PolicyError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for PolicyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PolicyError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_policy_is_consistent() {
        RankingPolicy::standard()
            .validate()
            .expect("standard policy validates");
    }

    #[test]
    fn classify_finds_each_tier() {
        let venues = RankingPolicy::standard().venues;
        assert_eq!(
            venues.classify(VenueId(101)).map(|rule| rule.tier),
            Some(VenueTier::Top)
        );
        assert_eq!(
            venues.classify(VenueId(203)).map(|rule| rule.points),
            Some(6)
        );
        assert!(venues.classify(VenueId(9_999)).is_none());
    }

    #[test]
    fn csv_reclassification_keeps_point_awards() {
        let csv = "venue_id,tier\n 900 , top\n901,b\n902,b\n";
        let venues = RankingPolicy::standard()
            .venues
            .reclassified_from_csv(csv.as_bytes())
            .expect("csv imports");

        let top = venues.classify(VenueId(900)).expect("900 classified");
        assert_eq!((top.tier, top.points), (VenueTier::Top, 10));
        assert_eq!(
            venues.classify(VenueId(902)).map(|rule| rule.points),
            Some(3)
        );
        assert!(
            venues.classify(VenueId(101)).is_none(),
            "previous membership is replaced"
        );
    }

    #[test]
    fn csv_rejects_venue_in_two_tiers() {
        let csv = "venue_id,tier\n900,top\n900,a\n";
        let error = RankingPolicy::standard()
            .venues
            .reclassified_from_csv(csv.as_bytes())
            .expect_err("overlap rejected");
        assert!(error.to_string().contains("900"));
    }

    #[test]
    fn json_round_trip_preserves_policy() {
        let policy = RankingPolicy::standard();
        let json = serde_json::to_string(&policy).expect("serializes");
        let loaded = RankingPolicy::from_json_reader(json.as_bytes()).expect("loads");
        assert_eq!(loaded, policy);
    }

    #[test]
    fn rank_rows_out_of_order_are_rejected() {
        let mut policy = RankingPolicy::standard();
        policy.ranks.reverse();
        assert!(matches!(policy.validate(), Err(PolicyError::Invalid(_))));
    }
}
