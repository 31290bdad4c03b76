use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No saved session found at {0}")]
    Missing(PathBuf),

    #[error("Failed to read session file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse session file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session has no live cookies - log in again to refresh it")]
    NoLiveCookies,

    #[error("Session expired - the guest list redirected to {0}")]
    Expired(String),
}

/// One cookie from the stored session, in browser storage-state form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; -1 marks a session cookie
    #[serde(default = "session_cookie_expiry")]
    pub expires: f64,
    #[serde(rename = "httpOnly", default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(rename = "sameSite", default)]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_cookie_expiry() -> f64 {
    -1.0
}

impl StoredCookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires >= 0.0 && self.expires < now.timestamp() as f64
    }

    /// Does this cookie apply to the given host?
    pub fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Cookie object for the WebDriver add-cookie command
    pub fn to_webdriver(&self) -> serde_json::Value {
        let mut cookie = serde_json::json!({
            "name": self.name,
            "value": self.value,
            "domain": self.domain,
            "path": self.path,
            "httpOnly": self.http_only,
            "secure": self.secure,
        });
        if self.expires >= 0.0 {
            cookie["expiry"] = serde_json::json!(self.expires as u64);
        }
        if let Some(ref same_site) = self.same_site {
            cookie["sameSite"] = serde_json::json!(same_site);
        }
        cookie
    }
}

/// Persisted browser session: cookies plus per-origin storage, treated as opaque beyond cookies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl SessionState {
    /// Load the session blob from disk
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        if !path.exists() {
            return Err(SessionError::Missing(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path).map_err(|source| SessionError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let state: SessionState =
            serde_json::from_str(&contents).map_err(|source| SessionError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(cookies = state.cookies.len(), "Session loaded");
        Ok(state)
    }

    /// Check the session is usable before handing it to a run
    pub fn verify(&self) -> Result<(), SessionError> {
        let now = Utc::now();
        if self.cookies.iter().any(|c| !c.is_expired(now)) {
            Ok(())
        } else {
            Err(SessionError::NoLiveCookies)
        }
    }

    /// Unexpired cookies that apply to `host`
    pub fn live_cookies_for<'a>(
        &'a self,
        host: &'a str,
    ) -> impl Iterator<Item = &'a StoredCookie> + 'a {
        let now = Utc::now();
        self.cookies
            .iter()
            .filter(move |c| !c.is_expired(now) && c.matches_host(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = r#"{
        "cookies": [
            {"name": "sid", "value": "abc", "domain": ".zola.com", "path": "/", "expires": -1, "httpOnly": true, "secure": true, "sameSite": "Lax"},
            {"name": "old", "value": "x", "domain": "www.zola.com", "expires": 1000}
        ],
        "origins": [{"origin": "https://www.zola.com", "localStorage": []}]
    }"#;

    #[test]
    fn test_parse_storage_state() {
        let state: SessionState = serde_json::from_str(BLOB).unwrap();
        assert_eq!(state.cookies.len(), 2);
        assert_eq!(state.cookies[1].path, "/");
        assert!(state.cookies[0].http_only);
        assert!(state.verify().is_ok());
    }

    #[test]
    fn test_expired_cookies_filtered() {
        let state: SessionState = serde_json::from_str(BLOB).unwrap();
        let live: Vec<_> = state
            .live_cookies_for("www.zola.com")
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(live, vec!["sid"]);
    }

    #[test]
    fn test_verify_rejects_only_expired() {
        let state: SessionState = serde_json::from_str(
            r#"{"cookies": [{"name": "old", "value": "x", "domain": "zola.com", "expires": 1000}]}"#,
        )
        .unwrap();
        assert!(matches!(state.verify(), Err(SessionError::NoLiveCookies)));
        assert!(matches!(SessionState::default().verify(), Err(SessionError::NoLiveCookies)));
    }

    #[test]
    fn test_matches_host() {
        let state: SessionState = serde_json::from_str(BLOB).unwrap();
        let sid = &state.cookies[0];
        assert!(sid.matches_host("zola.com"));
        assert!(sid.matches_host("www.zola.com"));
        assert!(!sid.matches_host("notzola.com"));
    }

    #[test]
    fn test_to_webdriver_omits_expiry_for_session_cookie() {
        let state: SessionState = serde_json::from_str(BLOB).unwrap();
        let cookie = state.cookies[0].to_webdriver();
        assert!(cookie.get("expiry").is_none());
        assert_eq!(cookie["sameSite"], "Lax");
        assert_eq!(state.cookies[1].to_webdriver()["expiry"], 1000);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("rsvpscrape-missing-session.json");
        assert!(matches!(SessionState::load(&path), Err(SessionError::Missing(_))));
    }
}
