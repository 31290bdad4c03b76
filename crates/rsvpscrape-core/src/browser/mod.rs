//! Browser capabilities used by the scrape orchestrator.
//!
//! The remote guest list is reached only through two seams:
//! - `Navigator`: find a household row, open its detail view, switch panels, close
//! - `Extractor`: read identity and responses out of an open detail view
//!
//! `GuestListPage` implements both over a W3C WebDriver session. Retry and merge
//! logic never see selectors or driver calls.

pub mod error;
pub mod guest_list;
pub mod scripts;
pub mod webdriver;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{IdentityInfo, ResponseInfo};

pub use error::DriverError;
pub use guest_list::GuestListPage;
pub use webdriver::WebDriverClient;

/// Maximum characters of an underlying error kept in a failure reason
const MAX_REASON_DETAIL: usize = 50;

/// The two information panels of a household detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Identity,
    Responses,
}

impl Panel {
    /// Tab caption on the remote detail view
    pub fn caption(&self) -> &'static str {
        match self {
            Panel::Identity => "Guest Info",
            Panel::Responses => "RSVP Status",
        }
    }
}

/// An open detail view, plus what the list row showed for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHandle {
    pub position: usize,
    pub display_name: String,
    pub row_relationship: Option<String>,
}

/// Per-attempt delays chosen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long to wait for the detail view after a click
    pub click_delay: Duration,
    /// Pause after closing the view before the next household
    pub settle_delay: Duration,
}

#[derive(Error, Debug)]
pub enum NavError {
    #[error("Modal did not open")]
    NotOpened { display_name: String },

    #[error("Index out of range")]
    OutOfRange { position: usize, rows: usize },

    #[error("Timeout")]
    Timeout { display_name: Option<String> },

    #[error("Error: {0}")]
    Driver(#[from] DriverError),
}

impl NavError {
    /// Best-known display name of the household, when the row was read before failing
    pub fn display_name(&self) -> Option<&str> {
        match self {
            NavError::NotOpened { display_name } => Some(display_name),
            NavError::Timeout { display_name } => display_name.as_deref(),
            _ => None,
        }
    }

    /// Short reason recorded in the failure log
    pub fn reason(&self) -> String {
        match self {
            NavError::Driver(e) if e.is_timeout() => "Timeout".to_string(),
            NavError::Driver(e) => {
                let detail: String = e.to_string().chars().take(MAX_REASON_DETAIL).collect();
                format!("Error: {}", detail)
            }
            other => other.to_string(),
        }
    }
}

/// Locating and opening household detail views.
#[async_trait]
pub trait Navigator: Send {
    /// Reload the list from scratch to clear transient UI state; returns the row count
    async fn reload_list(&mut self) -> Result<usize, NavError>;

    /// Open the detail view of the household at `position`, re-resolving the row every call.
    async fn open(&mut self, position: usize, timing: Timing) -> Result<ViewHandle, NavError>;

    /// Best effort; a missing panel control is not an error.
    async fn switch_panel(&mut self, handle: &ViewHandle, panel: Panel);

    /// Close any open detail view. Safe to call when nothing is open.
    async fn close(&mut self);
}

/// Reading an open detail view. Never fails: gaps come back as empty fields.
#[async_trait]
pub trait Extractor: Send {
    async fn extract_identity(&mut self, handle: &ViewHandle) -> IdentityInfo;

    async fn extract_responses(&mut self, handle: &ViewHandle) -> ResponseInfo;
}
