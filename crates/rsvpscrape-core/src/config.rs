//! Application configuration management.
//!
//! This module handles loading the run configuration: where the guest list lives,
//! where the session blob and outputs are kept, the deployment profile (canonical
//! events, principals, relationship vocabulary) and the retry settings.
//!
//! Configuration is stored at `~/.config/rsvpscrape/config.json`. A missing file
//! yields the defaults; command-line flags override individual fields.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "rsvpscrape";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Guest list page of the remote application
const DEFAULT_GUEST_LIST_URL: &str = "https://www.zola.com/wedding/manage/guests/all";

/// Local chromedriver's default endpoint
const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Session blob file name, stored next to the config
const SESSION_FILE: &str = "session.json";

// ============================================================================
// Deployment Profile
// ============================================================================

/// A canonical event and the keywords that identify it in loosely matching labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl EventDef {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// One of the two people the event is organized around, and the side label they anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    pub side: String,
}

/// Deployment-specific vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Canonical events, in output column order
    pub events: Vec<EventDef>,
    /// Checked in order when deriving a side
    pub principals: Vec<Principal>,
    /// Known relationship categories; the first one contained in the raw text wins
    pub relationships: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            events: vec![
                EventDef::new("Mahek's Vidhi & Haaldi", &["mahek", "vidhi"]),
                EventDef::new("Saumya's Vidhi & Haaldi", &["saumya", "vidhi"]),
                EventDef::new("Wedding", &[]),
                EventDef::new("Reception", &[]),
            ],
            principals: vec![
                Principal { name: "Saumya".to_string(), side: "Bride".to_string() },
                Principal { name: "Mahek".to_string(), side: "Groom".to_string() },
            ],
            relationships: [
                "Saumya's Family Friend",
                "Saumya's Friend",
                "Saumya's Family",
                "Saumya's Wedding Party",
                "Mahek's Family Friend",
                "Mahek's Friend",
                "Mahek's Family",
                "Mahek's Wedding Party",
                "Mahek and Saumya's Friend",
            ]
            .iter()
            .map(|r| r.to_string())
            .collect(),
        }
    }
}

impl Profile {
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.name.as_str())
    }

    pub fn principal_names(&self) -> Vec<String> {
        self.principals.iter().map(|p| p.name.clone()).collect()
    }
}

// ============================================================================
// Retry Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per household in the main sweep
    pub max_immediate_retries: u32,
    /// Run a slower second pass over households that failed the main sweep
    pub retry_pass_enabled: bool,
    /// Attempts per household in the retry pass
    pub retry_pass_max_attempts: u32,
    /// Base delay between UI operations in the main sweep
    pub base_delay_ms: u64,
    /// Growth factor applied to the click delay on each further attempt
    pub retry_delay_multiplier: f64,
    /// Permanent failures tolerated before the run is marked failed
    pub max_acceptable_failures: usize,
    /// Base delay used throughout the retry pass
    pub slow_mode_delay_ms: u64,
    /// Main-sweep households between intermediate checkpoints
    pub checkpoint_every: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_immediate_retries: 3,
            retry_pass_enabled: true,
            retry_pass_max_attempts: 2,
            base_delay_ms: 800,
            retry_delay_multiplier: 1.5,
            max_acceptable_failures: 5,
            slow_mode_delay_ms: 2000,
            checkpoint_every: 25,
        }
    }
}

impl RetryConfig {
    /// Slower timings for flaky sessions
    pub fn slow() -> Self {
        Self {
            base_delay_ms: 1500,
            slow_mode_delay_ms: 2500,
            ..Self::default()
        }
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub guest_list_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub webdriver_url: Option<String>,
    pub profile: Profile,
    pub retry: RetryConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Write this config to the default location, returning the path written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(path)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn guest_list_url(&self) -> &str {
        self.guest_list_url.as_deref().unwrap_or(DEFAULT_GUEST_LIST_URL)
    }

    pub fn webdriver_url(&self) -> &str {
        self.webdriver_url.as_deref().unwrap_or(DEFAULT_WEBDRIVER_URL)
    }

    pub fn session_file(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.session_file {
            return Ok(path.clone());
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(SESSION_FILE))
    }

    pub fn output_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.output_dir {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join("scraped"))
    }
}
