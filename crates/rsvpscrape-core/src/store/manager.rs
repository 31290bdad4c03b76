use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info};

use super::Dataset;
use crate::models::{FailedAttempt, FailureLog};

/// Prefix of every dataset file
const DATASET_PREFIX: &str = "rsvp_guests_";

/// Prefix of every failure log file
const FAILURE_LOG_PREFIX: &str = "failed_guests_";

/// Subdirectory of the output dir holding diagnostic screenshots
const SCREENSHOT_DIR: &str = "screenshots";

/// Run timestamp format; sorts lexically in time order
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Which flavor of dataset is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// Complete output of a run
    Final,
    /// Periodic checkpoint during the main sweep
    Partial,
    /// Written when the run is interrupted by the user
    Interrupted,
    /// Written when the run aborts on an error
    Error,
}

impl DatasetKind {
    fn suffix(&self) -> &'static str {
        match self {
            DatasetKind::Final => "",
            DatasetKind::Partial => "_partial",
            DatasetKind::Interrupted => "_interrupted",
            DatasetKind::Error => "_error",
        }
    }
}

pub struct OutputStore {
    output_dir: PathBuf,
    timestamp: String,
}

impl OutputStore {
    pub fn new(output_dir: PathBuf, timestamp: String) -> Result<Self> {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;
        Ok(Self {
            output_dir,
            timestamp,
        })
    }

    /// Timestamp for a run starting now
    pub fn run_timestamp() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn dataset_path(&self, kind: DatasetKind) -> PathBuf {
        self.output_dir
            .join(format!("{}{}{}.csv", DATASET_PREFIX, self.timestamp, kind.suffix()))
    }

    fn failure_log_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}{}.json", FAILURE_LOG_PREFIX, self.timestamp))
    }

    // ===== Datasets =====

    pub fn save_dataset(&self, kind: DatasetKind, dataset: &Dataset) -> Result<PathBuf> {
        let path = self.dataset_path(kind);
        dataset.write(&path)?;
        info!(path = %path.display(), rows = dataset.len(), ?kind, "Saved dataset");
        Ok(path)
    }

    /// Newest complete dataset: not a checkpoint, interrupted or error file.
    pub fn latest_complete_dataset(&self) -> Result<Option<PathBuf>> {
        let newest = self
            .list_with_prefix(DATASET_PREFIX, "csv")?
            .into_iter()
            .filter(|path| {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                !["partial", "error", "interrupted"].iter().any(|tag| name.contains(tag))
            })
            .next_back();
        Ok(newest)
    }

    /// Resolve a user-supplied merge target, trying it as given and then inside the output dir.
    pub fn resolve_merge_target(&self, raw: &Path) -> Option<PathBuf> {
        if raw.exists() {
            return Some(raw.to_path_buf());
        }
        let candidate = self.output_dir.join(raw);
        candidate.exists().then_some(candidate)
    }

    // ===== Screenshots =====

    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.output_dir
            .join(SCREENSHOT_DIR)
            .join(format!("{}_{}.png", name, self.timestamp))
    }

    /// Write a PNG captured from the browser under the screenshots subdirectory.
    pub fn save_screenshot(&self, name: &str, png: &[u8]) -> Result<PathBuf> {
        let path = self.screenshot_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, png)
            .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
        info!(path = %path.display(), "Saved screenshot");
        Ok(path)
    }

    // ===== Failure Logs =====

    /// Write the failure log. Nothing is written when there are no failures.
    pub fn save_failures(&self, failures: &[FailedAttempt]) -> Result<Option<PathBuf>> {
        if failures.is_empty() {
            return Ok(None);
        }
        let log = FailureLog::new(self.timestamp.clone(), failures.to_vec());
        let path = self.failure_log_path();
        let contents = serde_json::to_string_pretty(&log)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write failure log {}", path.display()))?;
        info!(path = %path.display(), failed = failures.len(), "Saved failure log");
        Ok(Some(path))
    }

    /// Load the newest failure log in the output directory.
    pub fn latest_failure_log(&self) -> Result<Option<(PathBuf, FailureLog)>> {
        let Some(path) = self.list_with_prefix(FAILURE_LOG_PREFIX, "json")?.pop() else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read failure log {}", path.display()))?;
        let log: FailureLog = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse failure log {}", path.display()))?;
        debug!(path = %path.display(), failed = log.guests.len(), "Loaded failure log");
        Ok(Some((path, log)))
    }

    /// Files in the output dir with the given prefix and extension, oldest first.
    fn list_with_prefix(&self, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(prefix))
                .unwrap_or(false)
                && path.extension().and_then(|e| e.to_str()) == Some(extension);
            if matches {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

// ============================================================================
// Tests
// ============================================================================
