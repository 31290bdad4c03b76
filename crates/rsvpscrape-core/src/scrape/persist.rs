//! Writing run results: checkpoints, the final dataset and the failure log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use super::state::RunState;
use crate::config::Profile;
use crate::flatten::flatten_all;
use crate::merge::MergeTarget;
use crate::models::{dataset_headers, ScrapeResult};
use crate::store::{Dataset, DatasetKind, OutputStore};

/// Somewhere intermediate results can be written during a run.
pub trait Checkpoint: Send {
    fn save(&mut self, successes: &[ScrapeResult]) -> Result<()>;
}

/// Flatten successes into a dataset with the profile's columns
pub fn to_dataset(successes: &[ScrapeResult], profile: &Profile) -> Dataset {
    let headers = dataset_headers(profile.event_names());
    Dataset::from_records(headers, &flatten_all(successes, profile))
}

/// Periodic checkpoint written as the `_partial` dataset.
pub struct DatasetCheckpoint<'a> {
    store: &'a OutputStore,
    profile: &'a Profile,
}

impl<'a> DatasetCheckpoint<'a> {
    pub fn new(store: &'a OutputStore, profile: &'a Profile) -> Self {
        Self { store, profile }
    }
}

impl Checkpoint for DatasetCheckpoint<'_> {
    fn save(&mut self, successes: &[ScrapeResult]) -> Result<()> {
        let dataset = to_dataset(successes, self.profile);
        self.store.save_dataset(DatasetKind::Partial, &dataset)?;
        Ok(())
    }
}

/// Best-effort snapshot for an interrupted or aborted run.
///
/// Writes whatever succeeded as a `kind` dataset and the failure log, each only when non-empty.
pub fn save_snapshot(
    store: &OutputStore,
    kind: DatasetKind,
    state: &RunState,
    profile: &Profile,
) -> Result<Option<PathBuf>> {
    let dataset_path = if state.successes.is_empty() {
        None
    } else {
        Some(store.save_dataset(kind, &to_dataset(&state.successes, profile))?)
    };
    store.save_failures(&state.failures)?;
    Ok(dataset_path)
}

/// Write the final dataset, merged into `merge_target` when one is given, plus the failure log.
///
/// Returns the written path and dataset, or `None` when nothing succeeded.
pub fn save_final(
    store: &OutputStore,
    state: &RunState,
    profile: &Profile,
    merge_target: Option<&MergeTarget>,
) -> Result<Option<(PathBuf, Dataset)>> {
    store.save_failures(&state.failures)?;
    if state.successes.is_empty() {
        info!("No results to save");
        return Ok(None);
    }

    let headers = dataset_headers(profile.event_names());
    let records = flatten_all(&state.successes, profile);
    let dataset = match merge_target {
        Some(target) => {
            let merged = target
                .merge(&records, &headers)
                .with_context(|| format!("Failed to merge into {}", target.path.display()))?;
            info!(
                target = %target.path.display(),
                rows = merged.len(),
                "Merged with previous dataset"
            );
            merged
        }
        None => Dataset::from_records(headers, &records),
    };
    let path = store.save_dataset(DatasetKind::Final, &dataset)?;
    Ok(Some((path, dataset)))
}
