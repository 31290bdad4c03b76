//! Scrape run: target selection, the two-pass retry orchestrator, and persistence.

pub mod orchestrator;
pub mod persist;
pub mod selection;
pub mod state;

pub use orchestrator::{retry_wait, Orchestrator};
pub use persist::{save_snapshot, save_final, to_dataset, Checkpoint, DatasetCheckpoint};
pub use selection::Selection;
pub use state::{HouseholdState, Phase, RunOutcome, RunState};
