//! Session state handed to a run by the external login tooling.
//!
//! This module provides `SessionState`, the persisted browser storage blob
//! (cookies plus origin storage), and the validity check performed before
//! any scraping begins. Acquiring or refreshing the session happens elsewhere.

pub mod session;

pub use session::{SessionError, SessionState, StoredCookie};
