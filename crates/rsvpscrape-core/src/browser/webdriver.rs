//! Minimal W3C WebDriver client.
//!
//! Speaks the JSON wire protocol of a running driver (chromedriver, geckodriver,
//! or a Selenium endpoint) over reqwest. Only the commands the guest-list page
//! needs are wrapped.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::DriverError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP timeout for a single driver command.
/// Longer than the script timeout so the driver reports script timeouts itself.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Script timeout set on every new session
const SCRIPT_TIMEOUT_MS: u64 = 30_000;

/// Page load timeout set on every new session
const PAGE_LOAD_TIMEOUT_MS: u64 = 60_000;

/// Viewport matching the layout the guest list is scraped at
const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// Key identifying an element reference in WebDriver responses
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver code point for the Escape key
pub const KEY_ESCAPE: &str = "\u{E00C}";

/// A remote browser session.
pub struct WebDriverClient {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverClient {
    pub fn new(base_url: &str) -> Result<Self, DriverError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: None,
        })
    }

    /// Start a browser session, headless when `headless` is set.
    pub async fn start_session(&mut self, headless: bool) -> Result<(), DriverError> {
        let (width, height) = WINDOW_SIZE;
        let mut args = vec![format!("--window-size={},{}", width, height)];
        if headless {
            args.push("--headless=new".to_string());
        }
        let mut firefox_args = vec![];
        if headless {
            firefox_args.push("-headless".to_string());
        }

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "timeouts": { "script": SCRIPT_TIMEOUT_MS, "pageLoad": PAGE_LOAD_TIMEOUT_MS },
                    "goog:chromeOptions": { "args": args },
                    "moz:firefoxOptions": { "args": firefox_args }
                }
            }
        });

        let value = self.send(Method::POST, "/session", Some(capabilities)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DriverError::InvalidResponse("New session response missing sessionId".into())
            })?
            .to_string();
        debug!(session_id = %session_id, headless, "WebDriver session started");
        self.session_id = Some(session_id);

        // Firefox ignores chrome's window-size flag
        let _ = self
            .command(
                Method::POST,
                "/window/rect",
                Some(json!({ "width": width, "height": height })),
            )
            .await;
        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    pub async fn current_url(&self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::InvalidResponse("Current URL was not a string".into()))
    }

    pub async fn refresh(&self) -> Result<(), DriverError> {
        self.command(Method::POST, "/refresh", Some(json!({})))
            .await
            .map(|_| ())
    }

    pub async fn add_cookie(&self, cookie: Value) -> Result<(), DriverError> {
        self.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie })))
            .await
            .map(|_| ())
    }

    /// Run a synchronous script; `arguments[n]` inside the script are taken from `args`.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    /// Run a script and deserialize its return value
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<T, DriverError> {
        let value = self.execute(script, args).await?;
        serde_json::from_value(value)
            .map_err(|e| DriverError::InvalidResponse(format!("Unexpected script result: {}", e)))
    }

    /// Find one element by CSS selector, returning its reference id
    pub async fn find_element(&self, css: &str) -> Result<String, DriverError> {
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "css selector", "value": css })),
            )
            .await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DriverError::InvalidResponse("Element reference missing".into()))
    }

    /// Native click on a previously found element
    pub async fn click_element(&self, element_id: &str) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element_id),
            Some(json!({})),
        )
        .await
        .map(|_| ())
    }

    /// Press and release one key through the actions API
    pub async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        let actions = json!({
            "actions": [{
                "type": "key",
                "id": "keyboard",
                "actions": [
                    { "type": "keyDown", "value": key },
                    { "type": "keyUp", "value": key }
                ]
            }]
        });
        self.command(Method::POST, "/actions", Some(actions)).await?;
        self.command(Method::DELETE, "/actions", None).await.map(|_| ())
    }

    /// PNG of the current viewport
    pub async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let value = self.command(Method::GET, "/screenshot", None).await?;
        decode_screenshot(&value)
    }

    /// End the browser session. Errors are logged, not returned.
    pub async fn end_session(&mut self) {
        if let Some(id) = self.session_id.take() {
            let path = format!("/session/{}", id);
            if let Err(e) = self.send(Method::DELETE, &path, None).await {
                warn!(error = %e, "Failed to end WebDriver session");
            }
        }
    }

    // ========================================================================
    // Wire helpers
    // ========================================================================

    /// Session-scoped command
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        let id = self.session_id.as_ref().ok_or(DriverError::NoSession)?;
        self.send(method, &format!("/session/{}{}", id, path), body)
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        let mut payload: Value = response.json().await?;
        Ok(payload.get_mut("value").map(Value::take).unwrap_or(Value::Null))
    }

    /// Check if response is successful, returning a classified error if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, DriverError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriverError::from_wire(status, &body))
        }
    }
}

/// The screenshot command returns the PNG as a base64 string
fn decode_screenshot(value: &Value) -> Result<Vec<u8>, DriverError> {
    let encoded = value
        .as_str()
        .ok_or_else(|| DriverError::InvalidResponse("Screenshot was not a string".into()))?;
    B64.decode(encoded)
        .map_err(|e| DriverError::InvalidResponse(format!("Screenshot was not base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = WebDriverClient::new("http://localhost:9515/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9515");
        assert!(client.session_id.is_none());
    }

    #[test]
    fn test_decode_screenshot() {
        let png = decode_screenshot(&json!("iVBORw0KGgo=")).unwrap();
        assert_eq!(png, b"\x89PNG\r\n\x1a\n");

        assert!(matches!(decode_screenshot(&json!(null)), Err(DriverError::InvalidResponse(_))));
        assert!(matches!(
            decode_screenshot(&json!("not base64!")),
            Err(DriverError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_screenshot_without_session() {
        let client = WebDriverClient::new("http://localhost:9515").unwrap();
        assert!(matches!(client.screenshot().await, Err(DriverError::NoSession)));
    }

    #[tokio::test]
    async fn test_command_without_session() {
        let client = WebDriverClient::new("http://localhost:9515").unwrap();
        let err = client.current_url().await.unwrap_err();
        assert!(matches!(err, DriverError::NoSession));
    }
}
