use serde::{Deserialize, Serialize};

/// Canonical RSVP value for one person and one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Response {
    Attending,
    Declined,
    NoResponse,
    /// The person is not listed for the event at all.
    #[default]
    NotInvited,
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Response {
    /// Map a status code read from an event section.
    ///
    /// Recognizes the remote codes (`ATTENDING`, `DECLINED`, `NO_RESPONSE`) as well as
    /// their human labels. Anything else found inside a section still means the person
    /// was listed for the event, so it maps to `NoResponse`.
    pub fn from_code(code: &str) -> Self {
        let lower = code.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match lower.as_str() {
            "attending" | "accepted" | "yes" | "going" => Response::Attending,
            "declined" | "no" | "not going" | "regrets" => Response::Declined,
            _ => Response::NoResponse,
        }
    }

    /// Parse a dataset cell back into a response. Empty cells are `NotInvited`.
    pub fn from_cell(cell: &str) -> Option<Self> {
        match cell.trim() {
            "" => Some(Response::NotInvited),
            "Attending" => Some(Response::Attending),
            "Declined" => Some(Response::Declined),
            "No Response" => Some(Response::NoResponse),
            _ => None,
        }
    }

    /// Cell text used in the output dataset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Attending => "Attending",
            Response::Declined => "Declined",
            Response::NoResponse => "No Response",
            Response::NotInvited => "",
        }
    }
}
