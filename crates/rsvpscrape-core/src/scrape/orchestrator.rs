//! Two-pass retry orchestrator.
//!
//! The main sweep attempts every target in order with immediate retries. Households
//! that exhaust them are queued; once the sweep is done the list is reloaded and each
//! queued household gets a shorter, slower attempt sequence.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::persist::Checkpoint;
use super::state::{Phase, RunOutcome, RunState};
use crate::browser::{Extractor, Navigator, Panel, Timing};
use crate::config::RetryConfig;
use crate::models::{FailedAttempt, ScrapeResult};

/// Failure reason when the detail view opened but listed nobody
pub const NO_PEOPLE_REASON: &str = "No people extracted";

/// Wait before the next immediate retry of a household
pub fn retry_wait(config: &RetryConfig, attempt: u32) -> Duration {
    Duration::from_millis((config.base_delay_ms as f64 * attempt as f64 * 0.5) as u64)
}

pub struct Orchestrator<'a, S> {
    site: &'a mut S,
    config: RetryConfig,
    checkpoint: Option<&'a mut dyn Checkpoint>,
}

impl<'a, S: Navigator + Extractor> Orchestrator<'a, S> {
    pub fn new(site: &'a mut S, config: RetryConfig) -> Self {
        Self {
            site,
            config,
            checkpoint: None,
        }
    }

    /// Write intermediate results to `checkpoint` during the main sweep
    pub fn with_checkpoint(mut self, checkpoint: &'a mut dyn Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Scrape `targets` in order, then retry whatever failed.
    ///
    /// Results accumulate in `state` as they happen, so a caller that stops awaiting
    /// this future still holds every finished household.
    pub async fn run(&mut self, targets: &[usize], state: &mut RunState) -> Result<RunOutcome> {
        let total = targets.len();
        info!(
            households = total,
            immediate_retries = self.config.max_immediate_retries,
            retry_pass = self.config.retry_pass_enabled,
            "Starting main sweep"
        );

        for &position in targets {
            match self.scrape_household(position, Phase::Main, state).await {
                Ok((result, attempts)) => state.main_succeeded(result, attempts),
                Err(failure) => state.main_failed(failure),
            }

            let processed = state.processed();
            if self.config.checkpoint_every > 0 && processed % self.config.checkpoint_every == 0 {
                info!(
                    processed,
                    total,
                    succeeded = state.successes.len(),
                    failed = state.failures.len(),
                    "Progress"
                );
                self.write_checkpoint(state);
            }
        }

        if !state.failures.is_empty() && self.config.retry_pass_enabled {
            self.retry_pass(state).await?;
        }
        state.settle_queue();

        let outcome =
            RunOutcome::evaluate(state.failures.len(), self.config.max_acceptable_failures);
        info!(
            succeeded = state.successes.len(),
            failed = state.failures.len(),
            ?outcome,
            "Run complete"
        );
        Ok(outcome)
    }

    async fn retry_pass(&mut self, state: &mut RunState) -> Result<()> {
        info!(queued = state.failures.len(), "Starting retry pass");
        self.site
            .reload_list()
            .await
            .context("Failed to reload guest list for retry pass")?;

        // Successes leave the queue, so `slot` only advances past households that failed again
        let mut slot = 0;
        let queued = state.failures.len();
        for _ in 0..queued {
            let position = state.failures[slot].index;
            match self.scrape_household(position, Phase::RetryPass, state).await {
                Ok((result, attempts)) => {
                    info!(position, household = %result.display_name, "Retry succeeded");
                    state.retry_succeeded(slot, result, attempts);
                }
                Err(failure) => {
                    state.retry_failed(slot, failure);
                    slot += 1;
                }
            }
        }
        info!(still_failed = state.failures.len(), "Retry pass complete");
        Ok(())
    }

    /// Bounded attempt sequence for one household in one pass.
    ///
    /// Returns the result with the attempts it took, or a failure carrying this pass's attempts.
    pub async fn scrape_household(
        &mut self,
        position: usize,
        phase: Phase,
        state: &mut RunState,
    ) -> std::result::Result<(ScrapeResult, u32), FailedAttempt> {
        let max_attempts = phase.max_attempts(&self.config);
        let mut last_failure =
            FailedAttempt::new(position, format!("Guest {}", position + 1), "Unknown failure", 0);

        for attempt in 1..=max_attempts {
            state.begin_attempt(position, phase, attempt);
            let timing = phase.timing(&self.config, attempt);
            debug!(position, attempt, ?phase, "Attempting household");

            match self.attempt_once(position, timing).await {
                Ok(result) => {
                    info!(position, household = %result.display_name, attempt, "Scraped household");
                    return Ok((result, attempt));
                }
                Err(mut failure) => {
                    // Never carry an open view into the next attempt or household
                    self.site.close().await;
                    failure.attempts = attempt;
                    if attempt < max_attempts {
                        warn!(
                            position,
                            household = %failure.display_name,
                            reason = %failure.reason,
                            attempt,
                            max_attempts,
                            "Attempt failed, will retry"
                        );
                        tokio::time::sleep(retry_wait(&self.config, attempt)).await;
                    } else {
                        warn!(
                            position,
                            household = %failure.display_name,
                            reason = %failure.reason,
                            attempts = attempt,
                            "Attempts exhausted"
                        );
                    }
                    last_failure = failure;
                }
            }
        }
        Err(last_failure)
    }

    async fn attempt_once(
        &mut self,
        position: usize,
        timing: Timing,
    ) -> std::result::Result<ScrapeResult, FailedAttempt> {
        let handle = self.site.open(position, timing).await.map_err(|e| {
            let name = e
                .display_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Guest {}", position + 1));
            FailedAttempt::new(position, name, e.reason(), 0)
        })?;

        self.site.switch_panel(&handle, Panel::Identity).await;
        let identity = self.site.extract_identity(&handle).await;
        self.site.switch_panel(&handle, Panel::Responses).await;
        let responses = self.site.extract_responses(&handle).await;

        self.site.close().await;
        tokio::time::sleep(timing.settle_delay).await;

        let result = ScrapeResult {
            position,
            display_name: handle.display_name,
            row_relationship: handle.row_relationship,
            identity,
            responses,
        };
        if result.people().is_empty() {
            return Err(FailedAttempt::new(position, result.display_name, NO_PEOPLE_REASON, 0));
        }
        Ok(result)
    }

    fn write_checkpoint(&mut self, state: &RunState) {
        let Some(checkpoint) = self.checkpoint.as_mut() else {
            return;
        };
        if state.successes.is_empty() {
            return;
        }
        if let Err(e) = checkpoint.save(&state.successes) {
            warn!(error = %e, "Failed to write checkpoint");
        }
    }
}
