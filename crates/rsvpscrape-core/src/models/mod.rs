//! Data models for guest list extraction.
//!
//! This module contains the data structures that flow through a run:
//!
//! - `Response`: Canonical per-event RSVP value
//! - `IdentityInfo`, `ResponseInfo`, `ScrapeResult`: Raw per-household payloads
//! - `GuestRecord`: One flattened output row per person
//! - `FailedAttempt`, `FailureLog`: Households that exhausted their retries

pub mod failure;
pub mod household;
pub mod record;
pub mod response;

pub use failure::{FailedAttempt, FailureLog};
pub use household::{IdentityInfo, PersonResponses, ResponseInfo, ScrapeResult};
pub use record::{dataset_headers, event_column, GuestRecord, HOUSEHOLD_INDEX_COLUMN};
pub use response::Response;
