use std::path::PathBuf;

use clap::Parser;

use rsvpscrape_core::config::{Config, RetryConfig};
use rsvpscrape_core::Selection;

#[derive(Parser, Debug)]
#[command(name = "rsvpscrape")]
#[command(version, about = "Scrape a hosted wedding guest list into a per-person RSVP dataset", long_about = None)]
pub struct Cli {
    /// WebDriver endpoint (chromedriver, geckodriver or a Selenium server)
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// First household to scrape (0-based)
    #[arg(long, default_value_t = 0)]
    pub start: usize,

    /// Number of households to scrape (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Comma-separated household positions to scrape, in order
    #[arg(long, value_delimiter = ',', conflicts_with = "from_failed_log")]
    pub indices: Vec<usize>,

    /// Retry the households listed in the newest failure log
    #[arg(long)]
    pub from_failed_log: bool,

    /// Existing dataset to merge results into
    #[arg(long)]
    pub merge_with: Option<PathBuf>,

    /// Attempts per household in the main sweep
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Skip the retry pass over failed households
    #[arg(long)]
    pub no_retry_pass: bool,

    /// Attempts per household in the retry pass
    #[arg(long)]
    pub retry_pass_attempts: Option<u32>,

    /// Failed households tolerated before the run counts as failed
    #[arg(long)]
    pub max_failures: Option<usize>,

    /// Longer delays for slow or flaky sessions
    #[arg(long)]
    pub slow: bool,

    /// Directory for datasets, failure logs and the run log
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Stored browser session to authenticate with
    #[arg(long, env = "RSVPSCRAPE_SESSION")]
    pub session_file: Option<PathBuf>,

    /// Guest list page to scrape
    #[arg(long)]
    pub guest_list_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective config to the default location and exit
    #[arg(long)]
    pub init_config: bool,

    /// Seconds to keep a visible browser open after the run
    #[arg(long, default_value_t = 5)]
    pub keep_open: u64,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.webdriver_url {
            config.webdriver_url = Some(url.clone());
        }
        if let Some(ref url) = self.guest_list_url {
            config.guest_list_url = Some(url.clone());
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(ref path) = self.session_file {
            config.session_file = Some(path.clone());
        }

        let retry = &mut config.retry;
        if self.slow {
            let slow = RetryConfig::slow();
            retry.base_delay_ms = slow.base_delay_ms;
            retry.slow_mode_delay_ms = slow.slow_mode_delay_ms;
        }
        if let Some(max) = self.max_retries {
            retry.max_immediate_retries = max;
        }
        if self.no_retry_pass {
            retry.retry_pass_enabled = false;
        }
        if let Some(attempts) = self.retry_pass_attempts {
            retry.retry_pass_max_attempts = attempts;
        }
        if let Some(max) = self.max_failures {
            retry.max_acceptable_failures = max;
        }
    }

    /// Households chosen on the command line; failure-log selection is resolved separately.
    pub fn selection(&self) -> Selection {
        if !self.indices.is_empty() {
            return Selection::Explicit(self.indices.clone());
        }
        Selection::Window {
            start: self.start,
            limit: (self.limit > 0).then_some(self.limit),
        }
    }
}
