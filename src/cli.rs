use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use faculty_ranking::config::AppConfig;
use faculty_ranking::error::AppError;
use faculty_ranking::telemetry;
use faculty_ranking::workflows::tenure::{EvaluationEngine, PersonSnapshot, RankingPolicy};
use tracing::info;

use crate::demo::{run_demo, DemoArgs};

#[derive(Parser, Debug)]
#[command(
    name = "faculty-ranking",
    about = "Evaluate faculty tenure rank from approved evidence",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a person snapshot stored as JSON
    Evaluate(EvaluateArgs),
    /// Print the effective ranking policy as JSON
    Policy(PolicyArgs),
    /// Walk one person through hire, evaluation and termination (default command)
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Path to a person snapshot JSON file
    #[arg(long)]
    snapshot: PathBuf,
    /// Evaluation date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
    /// Ranking policy JSON overriding the configured one
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Ranking policy JSON overriding the configured one
    #[arg(long)]
    policy: Option<PathBuf>,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Evaluate(args) => run_evaluate(&config, args),
        Command::Policy(args) => {
            let policy = effective_policy(&config, args.policy)?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
            Ok(())
        }
        Command::Demo(args) => run_demo(effective_policy(&config, None)?, args),
    }
}

fn effective_policy(
    config: &AppConfig,
    override_path: Option<PathBuf>,
) -> Result<RankingPolicy, AppError> {
    match override_path {
        Some(path) => Ok(RankingPolicy::from_path(path)?),
        None => Ok(config.ranking_policy()?),
    }
}

fn run_evaluate(config: &AppConfig, args: EvaluateArgs) -> Result<(), AppError> {
    let policy = effective_policy(config, args.policy)?;
    let reader = BufReader::new(File::open(&args.snapshot)?);
    let snapshot: PersonSnapshot = serde_json::from_reader(reader)?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    info!(
        person = %snapshot.person_id,
        snapshot = %args.snapshot.display(),
        %as_of,
        "evaluating snapshot"
    );

    let result = EvaluationEngine::new(policy).evaluate(&snapshot, as_of);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
