use std::env;
use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::workflows::tenure::{PolicyError, RankingPolicy};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub ranking: RankingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let ranking = RankingConfig {
            policy_path: optional_var("RANKING_POLICY_PATH")?.map(PathBuf::from),
            venues_csv: optional_var("RANKING_VENUES_CSV")?.map(PathBuf::from),
            home_institution: optional_var("RANKING_HOME_INSTITUTION")?,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            ranking,
        })
    }

    /// Effective ranking policy after applying file and environment overrides.
    pub fn ranking_policy(&self) -> Result<RankingPolicy, ConfigError> {
        self.ranking.resolve().map_err(ConfigError::Policy)
    }
}

fn optional_var(variable: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(variable) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::BlankValue { variable }),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(_) => Ok(None),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Bare level or full `EnvFilter` directive.
    pub log_level: String,
    /// Colored output; only enabled for local development.
    pub ansi: bool,
}

/// Sources for the ranking policy tables.
#[derive(Debug, Clone, Default)]
pub struct RankingConfig {
    /// JSON policy file; the built-in table applies when unset.
    pub policy_path: Option<PathBuf>,
    /// `venue_id,tier` CSV replacing the policy's venue membership.
    pub venues_csv: Option<PathBuf>,
    pub home_institution: Option<String>,
}

impl RankingConfig {
    pub fn resolve(&self) -> Result<RankingPolicy, PolicyError> {
        let mut policy = match &self.policy_path {
            Some(path) => RankingPolicy::from_path(path)?,
            None => RankingPolicy::standard(),
        };

        if let Some(path) = &self.venues_csv {
            policy.venues = policy.venues.reclassified_from_path(path)?;
        }

        if let Some(institution) = &self.home_institution {
            policy.home_institution = institution.clone();
        }

        policy.validate()?;
        info!(
            version = %policy.version,
            home_institution = %policy.home_institution,
            "ranking policy loaded"
        );
        Ok(policy)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    BlankValue { variable: &'static str },
    Policy(PolicyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BlankValue { variable } => {
                write!(f, "{variable} is set but blank; unset it or provide a value")
            }
            ConfigError::Policy(err) => write!(f, "ranking policy unavailable: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::BlankValue { .. } => None,
            ConfigError::Policy(err) => Some(err),
        }
    }
}
