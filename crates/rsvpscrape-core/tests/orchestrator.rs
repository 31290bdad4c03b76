//! Retry orchestrator behavior against a scripted guest list.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use rsvpscrape_core::browser::{Extractor, NavError, Navigator, Panel, Timing, ViewHandle};
use rsvpscrape_core::config::RetryConfig;
use rsvpscrape_core::models::{IdentityInfo, Response, ResponseInfo, ScrapeResult};
use rsvpscrape_core::scrape::{Checkpoint, HouseholdState, Orchestrator, RunOutcome, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Opens,
    NoModal,
    Empty,
}

#[derive(Default)]
struct FakeGuestList {
    rows: usize,
    plans: HashMap<usize, VecDeque<Attempt>>,
    hang_at: Option<usize>,
    current: Option<(usize, Attempt)>,
    opened: Vec<usize>,
    reloads: usize,
    opened_while_stuck: usize,
}

impl FakeGuestList {
    fn new(rows: usize) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    fn plan(mut self, position: usize, attempts: &[Attempt]) -> Self {
        self.plans.insert(position, attempts.iter().copied().collect());
        self
    }

    fn always_failing(self, position: usize) -> Self {
        self.plan(position, &[Attempt::NoModal; 20])
    }
}

#[async_trait]
impl Navigator for FakeGuestList {
    async fn reload_list(&mut self) -> Result<usize, NavError> {
        self.reloads += 1;
        Ok(self.rows)
    }

    async fn open(&mut self, position: usize, _timing: Timing) -> Result<ViewHandle, NavError> {
        if self.current.is_some() {
            self.opened_while_stuck += 1;
        }
        if self.hang_at == Some(position) {
            std::future::pending::<()>().await;
        }
        if position >= self.rows {
            return Err(NavError::OutOfRange {
                position,
                rows: self.rows,
            });
        }
        self.opened.push(position);
        let attempt = self
            .plans
            .get_mut(&position)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Attempt::Opens);
        let display_name = format!("Household {}", position);
        // A view that failed to open still leaves UI state behind
        self.current = Some((position, attempt));
        if attempt == Attempt::NoModal {
            return Err(NavError::NotOpened { display_name });
        }
        Ok(ViewHandle {
            position,
            display_name,
            row_relationship: Some("Mahek's Friend".to_string()),
        })
    }

    async fn switch_panel(&mut self, _handle: &ViewHandle, _panel: Panel) {}

    async fn close(&mut self) {
        self.current = None;
    }
}

#[async_trait]
impl Extractor for FakeGuestList {
    async fn extract_identity(&mut self, handle: &ViewHandle) -> IdentityInfo {
        match self.current {
            Some((_, Attempt::Opens)) => IdentityInfo {
                primary_first: "Head".to_string(),
                primary_last: format!("Family{}", handle.position),
                ..IdentityInfo::default()
            },
            _ => IdentityInfo::default(),
        }
    }

    async fn extract_responses(&mut self, handle: &ViewHandle) -> ResponseInfo {
        let mut info = ResponseInfo::default();
        if let Some((_, Attempt::Opens)) = self.current {
            info.record_section(
                "Wedding",
                vec![
                    (format!("Head Family{}", handle.position), Response::Attending),
                    ("Guest".to_string(), Response::NoResponse),
                ],
            );
        }
        info
    }
}

#[derive(Default)]
struct RecordingCheckpoint {
    saves: Vec<usize>,
}

impl Checkpoint for RecordingCheckpoint {
    fn save(&mut self, successes: &[ScrapeResult]) -> Result<()> {
        self.saves.push(successes.len());
        Ok(())
    }
}

fn fast_config() -> RetryConfig {
    RetryConfig {
        base_delay_ms: 0,
        slow_mode_delay_ms: 0,
        ..RetryConfig::default()
    }
}

async fn run(
    site: &mut FakeGuestList,
    config: RetryConfig,
    targets: &[usize],
) -> (RunOutcome, RunState) {
    let mut state = RunState::new();
    let outcome = Orchestrator::new(site, config)
        .run(targets, &mut state)
        .await
        .unwrap();
    (outcome, state)
}

fn positions(state: &RunState) -> Vec<usize> {
    state.successes.iter().map(|r| r.position).collect()
}

#[tokio::test]
async fn test_all_households_succeed_in_order() {
    let mut site = FakeGuestList::new(5);
    let (outcome, state) = run(&mut site, fast_config(), &[0, 1, 2, 3, 4]).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert_eq!(positions(&state), vec![0, 1, 2, 3, 4]);
    assert!(state.failures.is_empty());
    assert_eq!(state.state_of(3), HouseholdState::Succeeded { attempts: 1 });
    assert_eq!(site.reloads, 0);
    assert_eq!(state.successes[0].people(), vec!["Head Family0", "Guest"]);
}

#[tokio::test]
async fn test_explicit_subset_order_preserved() {
    let mut site = FakeGuestList::new(10);
    let (_, state) = run(&mut site, fast_config(), &[7, 2, 5]).await;
    assert_eq!(positions(&state), vec![7, 2, 5]);
    assert_eq!(site.opened, vec![7, 2, 5]);
}

#[tokio::test]
async fn test_exhausted_household_sums_attempts_across_passes() {
    let mut site = FakeGuestList::new(4).always_failing(2);
    let (outcome, state) = run(&mut site, fast_config(), &[0, 1, 2, 3]).await;

    assert_eq!(state.failures.len(), 1);
    let failure = &state.failures[0];
    assert_eq!(failure.index, 2);
    assert_eq!(failure.attempts, 5);
    assert_eq!(failure.reason, "Modal did not open");
    assert_eq!(failure.display_name, "Household 2");
    assert_eq!(state.state_of(2), HouseholdState::PermanentFailure { attempts: 5 });
    assert_eq!(outcome, RunOutcome::QualifiedSuccess { failed: 1 });
    assert_eq!(site.reloads, 1);
    // Retry pass runs after the whole main sweep
    assert_eq!(site.opened, vec![0, 1, 2, 2, 2, 3, 2, 2]);
}

#[tokio::test]
async fn test_single_retry_pass_attempt() {
    let mut site = FakeGuestList::new(3).always_failing(1);
    let config = RetryConfig {
        retry_pass_max_attempts: 1,
        ..fast_config()
    };
    let (_, state) = run(&mut site, config, &[0, 1, 2]).await;
    assert_eq!(state.failures[0].attempts, 4);
}

#[tokio::test]
async fn test_retry_pass_success_moves_household() {
    let mut site =
        FakeGuestList::new(3).plan(1, &[Attempt::NoModal, Attempt::Empty, Attempt::NoModal]);
    let (outcome, state) = run(&mut site, fast_config(), &[0, 1, 2]).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert!(state.failures.is_empty());
    assert_eq!(positions(&state), vec![0, 2, 1]);
    assert_eq!(state.state_of(1), HouseholdState::Succeeded { attempts: 4 });
    assert_eq!(site.reloads, 1);
}

#[tokio::test]
async fn test_immediate_retry_recovers() {
    let mut site = FakeGuestList::new(2).plan(0, &[Attempt::NoModal]);
    let (outcome, state) = run(&mut site, fast_config(), &[0, 1]).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert_eq!(state.state_of(0), HouseholdState::Succeeded { attempts: 2 });
    assert_eq!(site.reloads, 0);
}

#[tokio::test]
async fn test_empty_extraction_reason() {
    let mut site = FakeGuestList::new(1).plan(0, &[Attempt::Empty; 5]);
    let (_, state) = run(&mut site, fast_config(), &[0]).await;
    assert_eq!(state.failures[0].reason, "No people extracted");
}

#[tokio::test]
async fn test_out_of_range_position_fails() {
    let mut site = FakeGuestList::new(2);
    let config = RetryConfig {
        retry_pass_enabled: false,
        ..fast_config()
    };
    let (_, state) = run(&mut site, config, &[9]).await;
    assert_eq!(state.failures[0].reason, "Index out of range");
    assert_eq!(state.failures[0].display_name, "Guest 10");
    assert_eq!(state.failures[0].attempts, 3);
}

#[tokio::test]
async fn test_view_force_closed_before_every_retry() {
    let mut site = FakeGuestList::new(3)
        .always_failing(0)
        .plan(1, &[Attempt::Empty, Attempt::NoModal]);
    run(&mut site, fast_config(), &[0, 1, 2]).await;
    assert_eq!(site.opened_while_stuck, 0);
}

#[tokio::test]
async fn test_failure_budget_boundary() {
    let config = RetryConfig {
        retry_pass_enabled: false,
        max_acceptable_failures: 1,
        ..fast_config()
    };

    let mut within = FakeGuestList::new(3).always_failing(0);
    let (outcome, _) = run(&mut within, config.clone(), &[0, 1, 2]).await;
    assert_eq!(outcome, RunOutcome::QualifiedSuccess { failed: 1 });
    assert!(!outcome.is_failure());

    let mut over = FakeGuestList::new(3).always_failing(0).always_failing(2);
    let (outcome, state) = run(&mut over, config, &[0, 1, 2]).await;
    assert!(outcome.is_failure());
    // Successes survive a failed run
    assert_eq!(positions(&state), vec![1]);
    assert_eq!(state.state_of(2), HouseholdState::PermanentFailure { attempts: 3 });
}

#[tokio::test]
async fn test_checkpoint_cadence() {
    let mut site = FakeGuestList::new(5);
    let mut checkpoint = RecordingCheckpoint::default();
    let config = RetryConfig {
        checkpoint_every: 2,
        ..fast_config()
    };
    let mut state = RunState::new();
    Orchestrator::new(&mut site, config)
        .with_checkpoint(&mut checkpoint)
        .run(&[0, 1, 2, 3, 4], &mut state)
        .await
        .unwrap();
    assert_eq!(checkpoint.saves, vec![2, 4]);
}

#[tokio::test]
async fn test_cancelled_run_keeps_finished_households() {
    let mut site = FakeGuestList::new(5).plan(1, &[Attempt::NoModal; 3]);
    site.hang_at = Some(3);
    let mut state = RunState::new();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        Orchestrator::new(&mut site, fast_config()).run(&[0, 1, 2, 3, 4], &mut state),
    )
    .await
    .is_err();

    assert!(cancelled);
    assert_eq!(positions(&state), vec![0, 2]);
    assert_eq!(state.failures.len(), 1);
    assert_eq!(state.failures[0].index, 1);
    assert_eq!(
        state.state_of(3),
        HouseholdState::Attempting { phase: rsvpscrape_core::scrape::Phase::Main, attempt: 1 }
    );
}
