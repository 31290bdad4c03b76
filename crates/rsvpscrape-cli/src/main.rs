//! rsvpscrape - scrape a hosted wedding guest list into a per-person RSVP dataset.
//!
//! Drives a browser through WebDriver, opens every household on the guest list,
//! retries flaky ones in a second slower pass and writes a CSV, optionally merged
//! into an earlier run's output.

mod args;

use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rsvpscrape_core::auth::SessionState;
use rsvpscrape_core::browser::GuestListPage;
use rsvpscrape_core::config::{Config, Profile};
use rsvpscrape_core::merge::MergeTarget;
use rsvpscrape_core::scrape::{
    save_final, save_snapshot, DatasetCheckpoint, Orchestrator, RunOutcome, RunState, Selection,
};
use rsvpscrape_core::store::{DatasetKind, OutputStore};
use rsvpscrape_core::summary::RsvpSummary;

use args::Cli;

// ============================================================================
// Constants
// ============================================================================

/// Run log written next to the datasets
const LOG_FILE: &str = "rsvpscrape.log";

/// Exit status after a run-level failure or fatal setup error
const EXIT_FAILURE: u8 = 1;

/// Exit status after Ctrl-C, matching shell convention for SIGINT
const EXIT_INTERRUPTED: u8 = 130;

/// Screenshot names, written under the output dir's screenshots folder
const SCREENSHOT_INITIAL: &str = "01_initial";
const SCREENSHOT_NO_GUESTS: &str = "error_no_guests";
const SCREENSHOT_ERROR: &str = "error_screenshot";

/// How the orchestrated part of a run ended
enum RunEnd {
    Finished(Result<RunOutcome>),
    Interrupted,
}

/// Initialize logging to stderr and to a file in the output directory
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply(&mut config);

    if cli.init_config {
        let path = config.save()?;
        println!("Wrote {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let store = OutputStore::new(config.output_dir()?, OutputStore::run_timestamp())?;
    let _log_guard = init_tracing(store.output_dir());
    let started = Local::now();
    info!(
        output_dir = %store.output_dir().display(),
        timestamp = store.timestamp(),
        "rsvpscrape starting"
    );

    // ===== Fatal checks, before any browser work =====

    let session_path = config.session_file()?;
    let session = SessionState::load(&session_path)?;
    session.verify()?;

    let selection = if cli.from_failed_log {
        let Some((path, log)) = store.latest_failure_log()? else {
            bail!(
                "No failure log found in {} - run a full scrape first",
                store.output_dir().display()
            );
        };
        let indices = log.indices();
        if indices.is_empty() {
            info!(path = %path.display(), "Failure log lists no households, nothing to retry");
            return Ok(ExitCode::SUCCESS);
        }
        info!(path = %path.display(), households = indices.len(), "Retrying from failure log");
        Selection::Explicit(indices)
    } else {
        cli.selection()
    };

    let merge_path = match cli.merge_with {
        Some(ref raw) => Some(
            store
                .resolve_merge_target(raw)
                .with_context(|| format!("Merge dataset not found: {}", raw.display()))?,
        ),
        None if cli.from_failed_log => {
            let detected = store.latest_complete_dataset()?;
            match detected {
                Some(ref path) => info!(path = %path.display(), "Auto-detected merge target"),
                None => warn!("No previous complete dataset found, results will not be merged"),
            }
            detected
        }
        None => None,
    };
    let merge_target = merge_path.as_deref().map(MergeTarget::load).transpose()?;

    // ===== Browser =====

    let profile = config.profile.clone();
    let mut page = GuestListPage::connect(
        config.webdriver_url(),
        config.guest_list_url(),
        &session,
        profile.clone(),
        cli.headless,
    )
    .await?;
    page.save_screenshot(&store, SCREENSHOT_INITIAL).await;

    let rows = match page.load_all_rows().await {
        Ok(rows) => rows,
        Err(e) => {
            page.save_screenshot(&store, SCREENSHOT_ERROR).await;
            page.shutdown().await;
            return Err(e).context("Failed to load the guest list");
        }
    };
    if rows == 0 {
        page.save_screenshot(&store, SCREENSHOT_NO_GUESTS).await;
        page.shutdown().await;
        bail!("No guests found - check that the guest list page loaded");
    }

    let targets = selection.targets(rows);
    if targets.is_empty() {
        info!(rows, "No households selected, nothing to do");
        page.shutdown().await;
        return Ok(ExitCode::SUCCESS);
    }

    // ===== Scrape =====

    let mut state = RunState::new();
    let mut checkpoint = DatasetCheckpoint::new(&store, &profile);
    let end = {
        let mut orchestrator =
            Orchestrator::new(&mut page, config.retry.clone()).with_checkpoint(&mut checkpoint);
        tokio::select! {
            result = orchestrator.run(&targets, &mut state) => RunEnd::Finished(result),
            _ = tokio::signal::ctrl_c() => RunEnd::Interrupted,
        }
    };

    // ===== Persist =====

    let code = match end {
        RunEnd::Finished(Ok(outcome)) => {
            match save_final(&store, &state, &profile, merge_target.as_ref()) {
                Ok(Some((_, dataset))) => RsvpSummary::from_dataset(&dataset, &profile).log(),
                Ok(None) => {}
                Err(e) => {
                    error!(error = %format!("{:#}", e), "Failed to save results");
                    snapshot(&store, DatasetKind::Error, &state, &profile);
                    page.shutdown().await;
                    return Err(e);
                }
            }
            report(&state, targets.len());

            if !cli.headless && cli.keep_open > 0 {
                info!(seconds = cli.keep_open, "Keeping browser open");
                tokio::time::sleep(Duration::from_secs(cli.keep_open)).await;
            }

            match outcome {
                RunOutcome::Success => {
                    info!("All households scraped successfully");
                    ExitCode::SUCCESS
                }
                RunOutcome::QualifiedSuccess { failed } => {
                    warn!(
                        failed,
                        budget = config.retry.max_acceptable_failures,
                        "Some households failed, within the failure budget"
                    );
                    ExitCode::SUCCESS
                }
                RunOutcome::PermanentFailure { failed, budget } => {
                    error!(failed, budget, "Too many households failed");
                    ExitCode::from(EXIT_FAILURE)
                }
            }
        }
        RunEnd::Finished(Err(e)) => {
            error!(error = %format!("{:#}", e), "Run aborted");
            page.save_screenshot(&store, SCREENSHOT_ERROR).await;
            snapshot(&store, DatasetKind::Error, &state, &profile);
            report(&state, targets.len());
            ExitCode::from(EXIT_FAILURE)
        }
        RunEnd::Interrupted => {
            warn!("Interrupted, saving progress");
            snapshot(&store, DatasetKind::Interrupted, &state, &profile);
            report(&state, targets.len());
            ExitCode::from(EXIT_INTERRUPTED)
        }
    };

    page.shutdown().await;
    let elapsed = Local::now() - started;
    info!(elapsed_secs = elapsed.num_seconds(), "rsvpscrape finished");
    Ok(code)
}

/// Best-effort save on an abnormal exit; errors are logged
fn snapshot(store: &OutputStore, kind: DatasetKind, state: &RunState, profile: &Profile) {
    match save_snapshot(store, kind, state, profile) {
        Ok(Some(path)) => info!(path = %path.display(), "Progress saved"),
        Ok(None) => info!("No successful households to save"),
        Err(e) => error!(error = %format!("{:#}", e), "Failed to save progress"),
    }
}

fn report(state: &RunState, attempted: usize) {
    let scraped = state.successes.len();
    info!(scraped, attempted, "Scraped {}/{} households", scraped, attempted);
    for failure in &state.failures {
        warn!(
            index = failure.index,
            household = %failure.display_name,
            reason = %failure.reason,
            attempts = failure.attempts,
            "Household failed"
        );
    }
}
