//! Guest-list RSVP scraper core.
//!
//! Opens every household of a hosted guest list, reads identity and per-event
//! responses, retries flaky households in two passes, flattens the results into
//! one row per person and merges them into earlier output.

pub mod auth;
pub mod browser;
pub mod config;
pub mod flatten;
pub mod matching;
pub mod merge;
pub mod models;
pub mod scrape;
pub mod store;
pub mod summary;

pub use config::{Config, Profile, RetryConfig};
pub use merge::{MergeError, MergeTarget};
pub use scrape::{Orchestrator, RunOutcome, RunState, Selection};
