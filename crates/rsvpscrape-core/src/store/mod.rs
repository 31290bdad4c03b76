//! Output storage for datasets and failure logs.
//!
//! This module provides the `OutputStore` that names and writes every file a run
//! produces in the output directory:
//! - Final, partial (checkpoint), interrupted and error datasets as CSV
//! - Failure logs as JSON
//!
//! File names carry the run timestamp, so lexical order is chronological order.

pub mod dataset;
pub mod manager;

pub use dataset::Dataset;
pub use manager::{DatasetKind, OutputStore};
