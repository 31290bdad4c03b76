use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("WebDriver command failed: {0}")]
    Command(String),

    #[error("No browser session started")]
    NoSession,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct WireError {
    value: WireErrorValue,
}

#[derive(Debug, Deserialize)]
struct WireErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

impl DriverError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    /// Classify a failed WebDriver response by its W3C error code.
    pub fn from_wire(status: reqwest::StatusCode, body: &str) -> Self {
        let Ok(wire) = serde_json::from_str::<WireError>(body) else {
            return DriverError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            ));
        };
        let message = Self::truncate_body(&wire.value.message);
        match wire.value.error.as_str() {
            "no such element" | "stale element reference" | "element not interactable" => {
                DriverError::NoSuchElement(message)
            }
            "timeout" | "script timeout" => DriverError::Timeout(message),
            "invalid session id" | "no such window" | "session not created" => {
                DriverError::SessionLost(message)
            }
            "javascript error" => DriverError::Script(message),
            other => DriverError::Command(format!("{}: {}", other, message)),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout(_))
    }
}
