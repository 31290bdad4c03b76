//! The remote guest list, driven through a WebDriver session.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::scripts;
use super::webdriver::KEY_ESCAPE;
use super::{
    DriverError, Extractor, NavError, Navigator, Panel, Timing, ViewHandle, WebDriverClient,
};
use crate::auth::{SessionError, SessionState};
use crate::config::Profile;
use crate::matching::{normalize_relationship, resolve_event, strip_list_number};
use crate::models::{IdentityInfo, Response, ResponseInfo};
use crate::store::OutputStore;

// ============================================================================
// Constants
// ============================================================================

/// Poll interval while waiting for page conditions
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pause before the fallback click
const FALLBACK_CLICK_PAUSE: Duration = Duration::from_millis(300);

/// Upper bound for the responses panel to render after a tab switch
const TAB_SWITCH_TIMEOUT: Duration = Duration::from_millis(1000);

/// Settle time after switching to the identity panel or expanding sections
const PANEL_SETTLE: Duration = Duration::from_millis(500);

/// Upper bound for the detail view to disappear after a close
const CLOSE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Settle time after (re)loading the list page
const PAGE_SETTLE: Duration = Duration::from_millis(3000);

/// Pause between scrolls while loading rows
const SCROLL_PAUSE: Duration = Duration::from_millis(500);

/// Consecutive unchanged row counts that mean the list is fully loaded
const STABLE_SCROLL_ROUNDS: u32 = 3;

/// Longest display name kept from a list row
const MAX_DISPLAY_NAME_CHARS: usize = 50;

/// Split a row's visible text into its display name and parenthesized relationship.
pub fn parse_row_text(text: &str, position: usize) -> (String, Option<String>) {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let display_name = lines
        .first()
        .map(|l| l.chars().take(MAX_DISPLAY_NAME_CHARS).collect())
        .unwrap_or_else(|| format!("Guest {}", position + 1));
    let relationship = lines
        .iter()
        .find(|l| l.len() >= 2 && l.starts_with('(') && l.ends_with(')'))
        .map(|l| l[1..l.len() - 1].trim().to_string());
    (display_name, relationship)
}

#[derive(Debug, Deserialize)]
struct RowInfo {
    rows: usize,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIdentity {
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    relationship: String,
    #[serde(default)]
    checked: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    label: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    codes: Vec<String>,
}

/// Household detail views reached through a live browser session.
pub struct GuestListPage {
    driver: WebDriverClient,
    profile: Profile,
    list_url: String,
}

impl GuestListPage {
    /// Start a browser, install the stored session and open the guest list.
    pub async fn connect(
        webdriver_url: &str,
        list_url: &str,
        session: &SessionState,
        profile: Profile,
        headless: bool,
    ) -> Result<Self> {
        let url = Url::parse(list_url)
            .with_context(|| format!("Invalid guest list URL {}", list_url))?;
        let host = url.host_str().unwrap_or_default().to_string();

        let mut driver = WebDriverClient::new(webdriver_url)?;
        driver
            .start_session(headless)
            .await
            .with_context(|| format!("Failed to start browser via {}", webdriver_url))?;

        let mut page = Self {
            driver,
            profile,
            list_url: list_url.to_string(),
        };
        if let Err(e) = page.install_session(&url, &host, session).await {
            page.shutdown().await;
            return Err(e);
        }
        Ok(page)
    }

    async fn install_session(
        &mut self,
        url: &Url,
        host: &str,
        session: &SessionState,
    ) -> Result<()> {
        // Cookies can only be set for the domain currently loaded
        let origin = url.origin().ascii_serialization();
        self.driver
            .navigate(&origin)
            .await
            .with_context(|| format!("Failed to load {}", origin))?;

        let mut installed = 0;
        for cookie in session.live_cookies_for(host) {
            match self.driver.add_cookie(cookie.to_webdriver()).await {
                Ok(()) => installed += 1,
                Err(e) => debug!(cookie = %cookie.name, error = %e, "Cookie rejected"),
            }
        }
        debug!(installed, "Session cookies installed");

        self.driver
            .navigate(&self.list_url)
            .await
            .context("Failed to open guest list")?;
        tokio::time::sleep(PAGE_SETTLE).await;

        let current = self.driver.current_url().await?;
        if current.to_lowercase().contains("login") {
            return Err(SessionError::Expired(current).into());
        }
        info!(url = %current, "Guest list opened");
        Ok(())
    }

    /// Scroll until the row count stops changing, then return to the top.
    pub async fn load_all_rows(&mut self) -> Result<usize, DriverError> {
        let mut last_count = 0;
        let mut stable_rounds = 0;
        while stable_rounds < STABLE_SCROLL_ROUNDS {
            let count: usize = self.driver.execute_as(scripts::SCROLL_TO_END, vec![]).await?;
            if count == last_count {
                stable_rounds += 1;
            } else {
                stable_rounds = 0;
                last_count = count;
            }
            tokio::time::sleep(SCROLL_PAUSE).await;
        }
        self.driver.execute(scripts::SCROLL_TO_TOP, vec![]).await?;
        tokio::time::sleep(SCROLL_PAUSE).await;
        info!(rows = last_count, "Guest list loaded");
        Ok(last_count)
    }

    /// End the browser session
    /// Capture the page into the store's screenshots. Failures are logged, not returned.
    pub async fn save_screenshot(
        &self,
        store: &OutputStore,
        name: &str,
    ) -> Option<std::path::PathBuf> {
        let png = match self.driver.screenshot().await {
            Ok(png) => png,
            Err(e) => {
                warn!(name, error = %e, "Failed to capture screenshot");
                return None;
            }
        };
        match store.save_screenshot(name, &png) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(name, error = %e, "Failed to save screenshot");
                None
            }
        }
    }

    pub async fn shutdown(&mut self) {
        self.driver.end_session().await;
    }

    async fn modal_present(&self) -> bool {
        self.driver
            .execute_as::<bool>(scripts::MODAL_PRESENT, vec![])
            .await
            .unwrap_or(false)
    }

    /// Poll a boolean script until it holds or `timeout` elapses
    async fn wait_until(&self, script: &str, expected: bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(value) = self.driver.execute_as::<bool>(script, vec![]).await {
                if value == expected {
                    return true;
                }
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn native_click(&self, position: usize) -> Result<(), DriverError> {
        let element = self
            .driver
            .find_element(&scripts::primary_name_selector(position))
            .await?;
        self.driver.click_element(&element).await
    }

    async fn read_identity(&self) -> Result<IdentityInfo, DriverError> {
        let principals = self.profile.principal_names();
        let raw: RawIdentity = self
            .driver
            .execute_as(scripts::IDENTITY, vec![json!(principals)])
            .await?;
        Ok(self.identity_from_raw(raw))
    }

    fn identity_from_raw(&self, raw: RawIdentity) -> IdentityInfo {
        let value = |i: usize| raw.values.get(i).cloned().unwrap_or_default();
        let mut info = IdentityInfo::default();
        if raw.values.len() >= 2 {
            info.primary_first = value(0);
            info.primary_last = value(1);
        }
        // Inputs run first, last, suffix, spacer for each of the two guests
        if raw.values.len() >= 6 {
            info.partner_first = value(4);
            info.partner_last = value(5);
        }
        if !raw.relationship.is_empty() {
            info.relationship =
                normalize_relationship(&raw.relationship, &self.profile.relationships);
        }
        for label in &raw.checked {
            if let Some(event) = resolve_event(label, &self.profile.events) {
                if !info.events_invited.contains(&event.name) {
                    info.events_invited.push(event.name.clone());
                }
            }
        }
        info
    }

    async fn read_responses(&self) -> Result<ResponseInfo, DriverError> {
        let sections: Vec<RawSection> = self.driver.execute_as(scripts::RESPONSES, vec![]).await?;
        Ok(self.responses_from_raw(sections))
    }

    fn responses_from_raw(&self, sections: Vec<RawSection>) -> ResponseInfo {
        let mut info = ResponseInfo::default();
        for section in sections {
            let Some(event) = resolve_event(&section.label, &self.profile.events) else {
                debug!(label = %section.label, "Skipping unrecognized event section");
                continue;
            };
            let entries = section
                .names
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    let response = section
                        .codes
                        .get(i)
                        .map(|c| Response::from_code(c))
                        .unwrap_or(Response::NoResponse);
                    (strip_list_number(raw).to_string(), response)
                })
                .filter(|(name, _)| !name.is_empty())
                .collect();
            info.record_section(&event.name, entries);
        }
        info
    }
}

#[async_trait]
impl Navigator for GuestListPage {
    async fn reload_list(&mut self) -> Result<usize, NavError> {
        info!("Reloading guest list");
        self.driver.refresh().await?;
        tokio::time::sleep(PAGE_SETTLE).await;
        Ok(self.load_all_rows().await?)
    }

    async fn open(&mut self, position: usize, timing: Timing) -> Result<ViewHandle, NavError> {
        let row: RowInfo = self
            .driver
            .execute_as(scripts::ROW_INFO, vec![json!(position)])
            .await?;
        let Some(text) = row.text else {
            return Err(NavError::OutOfRange {
                position,
                rows: row.rows,
            });
        };
        let (display_name, row_relationship) = parse_row_text(&text, position);
        let handle = ViewHandle {
            position,
            display_name,
            row_relationship,
        };

        if let Err(e) = self.native_click(position).await {
            debug!(position, error = %e, "Native click failed");
        }
        if self.wait_until(scripts::MODAL_PRESENT, true, timing.click_delay).await {
            return Ok(handle);
        }

        debug!(position, "Detail view did not open, trying fallback click");
        tokio::time::sleep(FALLBACK_CLICK_PAUSE).await;
        match self
            .driver
            .execute_as::<bool>(scripts::FALLBACK_CLICK, vec![json!(position)])
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Err(NavError::Timeout {
                    display_name: Some(handle.display_name),
                })
            }
            Err(e) => return Err(e.into()),
        }
        if self.wait_until(scripts::MODAL_PRESENT, true, timing.click_delay).await {
            return Ok(handle);
        }
        Err(NavError::NotOpened {
            display_name: handle.display_name,
        })
    }

    async fn switch_panel(&mut self, handle: &ViewHandle, panel: Panel) {
        let clicked = self
            .driver
            .execute_as::<bool>(scripts::CLICK_TAB, vec![json!(panel.caption())])
            .await
            .unwrap_or(false);
        if !clicked {
            debug!(
                household = %handle.display_name,
                panel = panel.caption(),
                "Panel control not found"
            );
        }

        match panel {
            Panel::Identity => tokio::time::sleep(PANEL_SETTLE).await,
            Panel::Responses => {
                if !self.wait_until(scripts::RESPONSES_READY, true, TAB_SWITCH_TIMEOUT).await {
                    warn!(household = %handle.display_name, "Responses panel not confirmed");
                    return;
                }
                match self.driver.execute_as::<u32>(scripts::EXPAND_SECTIONS, vec![]).await {
                    Ok(expanded) => debug!(expanded, "Expanded event sections"),
                    Err(e) => debug!(error = %e, "Failed to expand event sections"),
                }
                tokio::time::sleep(PANEL_SETTLE).await;
            }
        }
    }

    async fn close(&mut self) {
        if !self.modal_present().await {
            return;
        }
        let clicked = self
            .driver
            .execute_as::<bool>(scripts::CLOSE_BUTTON, vec![])
            .await
            .unwrap_or(false);
        if !clicked {
            if let Err(e) = self.driver.press_key(KEY_ESCAPE).await {
                debug!(error = %e, "Escape key failed");
            }
        }
        if !self.wait_until(scripts::MODAL_PRESENT, false, CLOSE_TIMEOUT).await {
            // One more Escape; whatever is left is cleared by the next open attempt
            let _ = self.driver.press_key(KEY_ESCAPE).await;
            warn!("Detail view still open after close");
        }
    }
}

#[async_trait]
impl Extractor for GuestListPage {
    async fn extract_identity(&mut self, handle: &ViewHandle) -> IdentityInfo {
        match self.read_identity().await {
            Ok(info) => info,
            Err(e) => {
                warn!(household = %handle.display_name, error = %e, "Identity extraction failed");
                IdentityInfo::default()
            }
        }
    }

    async fn extract_responses(&mut self, handle: &ViewHandle) -> ResponseInfo {
        match self.read_responses().await {
            Ok(info) => info,
            Err(e) => {
                warn!(household = %handle.display_name, error = %e, "Response extraction failed");
                ResponseInfo::default()
            }
        }
    }
}
