/// CLI glue for council-votes: argument parsing, run orchestration and the
/// user-visible summary.
///
/// Scraping, parsing and upload ordering live in [`council-votes-core`]. This
/// module only resolves configuration, picks the record store (Airtable or a
/// dry run) and reports the outcome.
///
/// For programmatic and integration use, call [`run`] with a constructed
/// [`Cli`].
///
/// [`council-votes-core`]: ../../council-votes-core/
use crate::load_config::{load_config, WindowOverrides};
use crate::upload::{AirtableClient, DryRunStore};
use anyhow::Result;
use clap::{Parser, Subcommand};
use council_votes_core::contract::RecordStore;
use council_votes_core::download::EscribeClient;
use council_votes_core::synchronise::{synchronise, PipelineSettings, SynchroniseReport};
use std::path::PathBuf;

/// CLI for council-votes: scrape recorded votes from eScribe minutes.
#[derive(Parser)]
#[clap(
    name = "council-votes",
    version,
    about = "Scrape council voting records from an eScribe portal and upload them to Airtable"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape meetings in the date window and upload their recorded votes
    Scrape {
        /// Optional YAML file with portal, minutes and store settings
        #[clap(long)]
        config: Option<PathBuf>,
        /// First day of the window (YYYY-MM-DD); overrides START_DATE
        #[clap(long)]
        start: Option<String>,
        /// Last day of the window (YYYY-MM-DD); overrides END_DATE
        #[clap(long)]
        end: Option<String>,
        /// Log the records instead of writing them to Airtable
        #[clap(long)]
        dry_run: bool,
    },
}

/// Async entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let result = match cli.command {
        Commands::Scrape {
            config,
            start,
            end,
            dry_run,
        } => scrape(config, WindowOverrides { start, end }, dry_run).await,
    };

    let exit_span = tracing::info_span!("exit", ok = result.is_ok());
    exit_span.in_scope(|| tracing::info!("exit"));
    result
}

async fn scrape(config: Option<PathBuf>, overrides: WindowOverrides, dry_run: bool) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let config = load_config(config.as_deref(), overrides, today)?;
    config.trace_loaded();
    tracing::info!(command = "scrape", dry_run, "Starting scrape");

    let source = EscribeClient::new(&config.source)?;
    let settings = config.pipeline_settings();
    if dry_run {
        let store = DryRunStore::default();
        scrape_into(&settings, &source, &store).await?;
        tracing::info!(records = store.issued(), "[DRY-RUN] No records were written");
    } else {
        let store = AirtableClient::new(&config.store)?;
        scrape_into(&settings, &source, &store).await?;
    }
    Ok(())
}

async fn scrape_into<S: RecordStore>(
    settings: &PipelineSettings,
    source: &EscribeClient,
    store: &S,
) -> Result<SynchroniseReport> {
    match synchronise(settings, source, store).await {
        Ok(report) => {
            tracing::info!(
                command = "scrape",
                meetings = report.meetings.len(),
                uploaded = report.uploaded_meetings(),
                skipped = report.skipped_meetings(),
                motions = report.motion_count(),
                votes = report.vote_count(),
                "Scrape complete"
            );
            println!("{}", summary(&report));
            Ok(report)
        }
        Err(e) => {
            tracing::error!(command = "scrape", error = %e, "Scrape failed");
            Err(anyhow::Error::new(e))
        }
    }
}

/// One-line human summary printed at the end of a successful run.
pub fn summary(report: &SynchroniseReport) -> String {
    format!(
        "Scrape complete: {} meetings listed, {} uploaded, {} skipped, {} motions, {} votes",
        report.meetings.len(),
        report.uploaded_meetings(),
        report.skipped_meetings(),
        report.motion_count(),
        report.vote_count()
    )
}
