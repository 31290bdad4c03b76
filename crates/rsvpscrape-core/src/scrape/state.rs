use std::collections::BTreeMap;
use std::time::Duration;

use crate::browser::Timing;
use crate::config::RetryConfig;
use crate::models::{FailedAttempt, ScrapeResult};

/// Which pass of the run a household is being attempted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Main,
    RetryPass,
}

impl Phase {
    pub fn max_attempts(self, config: &RetryConfig) -> u32 {
        let attempts = match self {
            Phase::Main => config.max_immediate_retries,
            Phase::RetryPass => config.retry_pass_max_attempts,
        };
        attempts.max(1)
    }

    /// Delays for one attempt; the click delay grows with each attempt of a pass.
    pub fn timing(self, config: &RetryConfig, attempt: u32) -> Timing {
        let growth = config.retry_delay_multiplier.powi(attempt.saturating_sub(1) as i32);
        let (base, settle_factor) = match self {
            Phase::Main => (config.base_delay_ms as f64, 0.4),
            Phase::RetryPass => (config.slow_mode_delay_ms as f64, 0.5),
        };
        Timing {
            click_delay: Duration::from_millis((base * growth) as u64),
            settle_delay: Duration::from_millis((base * settle_factor) as u64),
        }
    }
}

/// Where one household stands in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseholdState {
    Pending,
    Attempting { phase: Phase, attempt: u32 },
    Succeeded { attempts: u32 },
    QueuedForRetry { attempts: u32 },
    PermanentFailure { attempts: u32 },
}

/// Everything a run has accumulated so far.
///
/// Lives outside the orchestrator so it survives an interrupted run and can be
/// persisted on every exit path.
#[derive(Debug, Default)]
pub struct RunState {
    pub successes: Vec<ScrapeResult>,
    /// Failed households in the order their failures were recorded
    pub failures: Vec<FailedAttempt>,
    households: BTreeMap<usize, HouseholdState>,
    processed: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, position: usize) -> HouseholdState {
        self.households
            .get(&position)
            .copied()
            .unwrap_or(HouseholdState::Pending)
    }

    /// Main-sweep households finished so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    pub(crate) fn begin_attempt(&mut self, position: usize, phase: Phase, attempt: u32) {
        self.households
            .insert(position, HouseholdState::Attempting { phase, attempt });
    }

    pub(crate) fn main_succeeded(&mut self, result: ScrapeResult, attempts: u32) {
        self.households
            .insert(result.position, HouseholdState::Succeeded { attempts });
        self.successes.push(result);
        self.processed += 1;
    }

    pub(crate) fn main_failed(&mut self, failure: FailedAttempt) {
        self.households.insert(
            failure.index,
            HouseholdState::QueuedForRetry {
                attempts: failure.attempts,
            },
        );
        self.failures.push(failure);
        self.processed += 1;
    }

    /// Move the queued failure at `slot` into the success set.
    pub(crate) fn retry_succeeded(&mut self, slot: usize, result: ScrapeResult, attempts: u32) {
        let earlier = self.failures.remove(slot);
        self.households.insert(
            result.position,
            HouseholdState::Succeeded {
                attempts: earlier.attempts + attempts,
            },
        );
        self.successes.push(result);
    }

    pub(crate) fn retry_failed(&mut self, slot: usize, later: FailedAttempt) {
        let failure = &mut self.failures[slot];
        failure.absorb(later);
        self.households.insert(
            failure.index,
            HouseholdState::PermanentFailure {
                attempts: failure.attempts,
            },
        );
    }

    /// Households still queued once no retry pass will run become permanent failures
    pub(crate) fn settle_queue(&mut self) {
        for failure in &self.failures {
            self.households.insert(
                failure.index,
                HouseholdState::PermanentFailure {
                    attempts: failure.attempts,
                },
            );
        }
    }
}

/// Aggregate verdict of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Some households failed, within the failure budget
    QualifiedSuccess { failed: usize },
    /// More households failed than the budget allows
    PermanentFailure { failed: usize, budget: usize },
}

impl RunOutcome {
    pub fn evaluate(failed: usize, budget: usize) -> Self {
        if failed == 0 {
            RunOutcome::Success
        } else if failed <= budget {
            RunOutcome::QualifiedSuccess { failed }
        } else {
            RunOutcome::PermanentFailure { failed, budget }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::PermanentFailure { .. })
    }
}
