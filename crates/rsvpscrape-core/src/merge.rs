//! Merge engine: fold a new batch of records into a previously written dataset.
//!
//! Households present in the new batch replace their old rows wholesale; every
//! other household of the prior dataset is carried over untouched. The result is
//! sorted by household position.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{GuestRecord, HOUSEHOLD_INDEX_COLUMN};
use crate::store::Dataset;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Could not read merge target {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Merge target has no Household_Index column")]
    MissingIndexColumn,

    #[error("Merge target row {row} has invalid Household_Index {value:?}")]
    InvalidIndex { row: usize, value: String },
}

/// A previously written dataset that new results will be folded into.
#[derive(Debug, Clone)]
pub struct MergeTarget {
    pub path: PathBuf,
    pub prior: Dataset,
}

impl MergeTarget {
    /// Load and validate the prior dataset before any scraping starts.
    ///
    /// An unreadable prior dataset is an error, never an empty merge.
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let prior = Dataset::read(path).map_err(|source| MergeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let index_col = prior
            .column(HOUSEHOLD_INDEX_COLUMN)
            .ok_or(MergeError::MissingIndexColumn)?;
        for (row_num, row) in prior.rows.iter().enumerate() {
            parse_index(row, index_col, row_num)?;
        }
        info!(path = %path.display(), rows = prior.len(), "Loaded merge target");
        Ok(Self {
            path: path.to_path_buf(),
            prior,
        })
    }

    pub fn merge(
        &self,
        new_records: &[GuestRecord],
        headers: &[String],
    ) -> Result<Dataset, MergeError> {
        merge_into(new_records, &self.prior, headers)
    }
}

/// Load the prior dataset at `prior_path` and merge `new_records` into it.
pub fn merge(
    new_records: &[GuestRecord],
    prior_path: &Path,
    headers: &[String],
) -> Result<Dataset, MergeError> {
    MergeTarget::load(prior_path)?.merge(new_records, headers)
}

fn parse_index(row: &[String], index_col: usize, row_num: usize) -> Result<usize, MergeError> {
    let raw = row.get(index_col).map(|s| s.trim()).unwrap_or("");
    raw.parse().map_err(|_| MergeError::InvalidIndex {
        row: row_num + 1,
        value: raw.to_string(),
    })
}

/// Merge against an already loaded prior dataset.
pub fn merge_into(
    new_records: &[GuestRecord],
    prior: &Dataset,
    headers: &[String],
) -> Result<Dataset, MergeError> {
    let index_col = prior
        .column(HOUSEHOLD_INDEX_COLUMN)
        .ok_or(MergeError::MissingIndexColumn)?;

    let rescraped: HashSet<usize> = new_records.iter().map(|r| r.household_index).collect();

    // Map each output column to its position in the prior header, if present
    let projection: Vec<Option<usize>> = headers.iter().map(|h| prior.column(h)).collect();

    let mut keyed: Vec<(usize, Vec<String>)> = Vec::with_capacity(prior.len() + new_records.len());
    for (row_num, row) in prior.rows.iter().enumerate() {
        let index = parse_index(row, index_col, row_num)?;
        if rescraped.contains(&index) {
            continue;
        }
        let projected = projection
            .iter()
            .map(|col| col.and_then(|c| row.get(c)).cloned().unwrap_or_default())
            .collect();
        keyed.push((index, projected));
    }

    let kept = keyed.len();
    keyed.extend(new_records.iter().map(|r| (r.household_index, r.to_row())));

    // Stable, so each household's rows keep their original order
    keyed.sort_by_key(|(index, _)| *index);

    debug!(
        kept,
        replaced_households = rescraped.len(),
        new_rows = new_records.len(),
        "Merged datasets"
    );

    Ok(Dataset {
        headers: headers.to_vec(),
        rows: keyed.into_iter().map(|(_, row)| row).collect(),
    })
}
