use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};

mod allocator;
mod columns;
mod config;
mod continuity;
mod db;
mod engine;
mod error;
mod models;
mod percent;
mod report;
mod risk;
mod roster;
mod sheets;
mod store;
mod weekly_log;

use config::Config;
use engine::RunInputs;
use models::Gradebook;
use roster::{EnrolledRoster, StaffRoster};
use store::PointerStore;

#[derive(Parser)]
#[command(name = "mentor-assign")]
#[command(about = "Assigns struggling students to staff mentors in the weekly contact log", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply to anything it leaves out
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Scan the gradebook and write this week's assignments
    Run {
        /// Week label as it appears in the log's first row, e.g. "Week 6"
        #[arg(long)]
        week: Option<String>,
        #[arg(long)]
        gradebook: PathBuf,
        #[arg(long)]
        enrollment: PathBuf,
        #[arg(long)]
        log: PathBuf,
        #[arg(long)]
        staff: Option<PathBuf>,
        /// Pointer state file, used when DATABASE_URL is not set
        #[arg(long, default_value = "mentor-assign.json")]
        state_file: PathBuf,
        /// Show the assignments without writing the log or the pointer
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate a markdown caseload report for a week
    Report {
        #[arg(long)]
        week: Option<String>,
        #[arg(long)]
        log: PathBuf,
        #[arg(long, default_value = "caseloads.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&require_database_url()?).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Run {
            week,
            gradebook,
            enrollment,
            log,
            staff,
            state_file,
            dry_run,
        } => {
            if let Some(week) = week {
                config.week_label = week;
            }
            let store = match std::env::var("DATABASE_URL") {
                Ok(url) => PointerStore::Postgres(connect(&url).await?),
                Err(_) => PointerStore::File(state_file),
            };
            run(
                &config,
                &gradebook,
                &enrollment,
                &log,
                staff.as_deref(),
                &store,
                dry_run,
            )
            .await?;
        }
        Commands::Report { week, log, out } => {
            if let Some(week) = week {
                config.week_label = week;
            }
            let weekly_log = sheets::read_weekly_log(&log)?;
            let previous = config.previous_week();
            let report =
                report::build_report(&weekly_log, &config.week_label, previous.as_deref())?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn run(
    config: &Config,
    gradebook_path: &Path,
    enrollment_path: &Path,
    log_path: &Path,
    staff_path: Option<&Path>,
    store: &PointerStore,
    dry_run: bool,
) -> anyhow::Result<()> {
    let (email, name, role) = config.columns.indexes()?;
    let gradebook = Gradebook::from_rows(sheets::read_rows(gradebook_path)?, email, name, role);
    let enrolled = EnrolledRoster::from_names(sheets::read_name_column(enrollment_path)?);
    let staff = StaffRoster::new(sheets::read_staff(staff_path, &config.default_staff)?)?;
    let mut weekly_log = sheets::read_weekly_log(log_path)?;
    let pointer = store.load(&config.pointer_key).await?;

    info!(
        week = %config.week_label,
        students = gradebook.students.len(),
        enrolled = enrolled.len(),
        staff = ?staff.names(),
        pointer,
        "starting run"
    );

    let inputs = RunInputs {
        gradebook: &gradebook,
        enrolled: &enrolled,
        staff,
        pointer,
    };
    let result = engine::run(config, inputs, &mut weekly_log);

    if dry_run {
        let outcome = result?;
        println!("Dry run for {}: {}", config.week_label, outcome.summary);
        for assignment in &outcome.assignments {
            println!(
                "- {} -> {} ({}, row {})",
                assignment.email,
                assignment.staff,
                assignment.source,
                assignment.row + 1
            );
        }
        return Ok(());
    }

    // Rows already placed stay in the log even when the run fails.
    sheets::write_weekly_log(log_path, &weekly_log)
        .with_context(|| format!("failed to save weekly log {}", log_path.display()))?;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(%err, "run aborted; rotation pointer left unchanged");
            return Err(err.into());
        }
    };

    store.save(&config.pointer_key, outcome.pointer).await?;
    if let Err(err) = store
        .record_run(&config.week_label, &outcome.summary, outcome.pointer)
        .await
    {
        warn!(%err, "failed to record run history");
    }

    println!("{}: {}", config.week_label, outcome.summary);
    Ok(())
}

fn require_database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")
}

async fn connect(database_url: &str) -> anyhow::Result<sqlx::PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}
