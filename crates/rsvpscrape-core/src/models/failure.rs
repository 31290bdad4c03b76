use serde::{Deserialize, Serialize};

/// A household that failed every attempt of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub index: usize,
    pub display_name: String,
    pub reason: String,
    /// Attempts summed across every pass that failed
    pub attempts: u32,
}

impl FailedAttempt {
    pub fn new(
        index: usize,
        display_name: impl Into<String>,
        reason: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            index,
            display_name: display_name.into(),
            reason: reason.into(),
            attempts,
        }
    }

    /// Fold a later failed pass into this record: the newest reason wins, attempts add up.
    pub fn absorb(&mut self, later: FailedAttempt) {
        self.attempts += later.attempts;
        self.reason = later.reason;
        if !later.display_name.is_empty() {
            self.display_name = later.display_name;
        }
    }
}

/// On-disk failure log written when failures remain after both passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureLog {
    pub timestamp: String,
    pub total_failed: usize,
    pub guests: Vec<FailedAttempt>,
}

impl FailureLog {
    pub fn new(timestamp: impl Into<String>, guests: Vec<FailedAttempt>) -> Self {
        Self {
            timestamp: timestamp.into(),
            total_failed: guests.len(),
            guests,
        }
    }

    /// Positions to retry, in the order failures were recorded, without duplicates.
    pub fn indices(&self) -> Vec<usize> {
        let mut seen = std::collections::HashSet::new();
        self.guests
            .iter()
            .map(|g| g.index)
            .filter(|idx| seen.insert(*idx))
            .collect()
    }
}
