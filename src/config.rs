//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog store RPC endpoint, e.g. https://store.example.com
    #[serde(default)]
    pub store_url: Option<String>,

    /// Deploy key sent to the store as a bearer token
    #[serde(default)]
    pub store_key: Option<String>,

    /// WebDriver endpoint that drives the headless browser
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Directory for crawl batches and debug screenshots
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Per-page load timeout in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Wall-clock budget for one crawl run in seconds
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,

    /// Ceiling on listing pages crawled per category
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Retries after a failed page load
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Parallel image mirror downloads
    #[serde(default = "default_mirror_workers")]
    pub mirror_workers: usize,

    /// Verbose console output
    #[serde(default)]
    pub verbose: bool,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("crawler-outputs")
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_run_budget_secs() -> u64 {
    600
}

fn default_max_pages() -> u32 {
    50
}

fn default_retries() -> u32 {
    2
}

fn default_mirror_workers() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_url: None,
            store_key: None,
            webdriver_url: default_webdriver_url(),
            output_dir: default_output_dir(),
            page_timeout_secs: default_page_timeout_secs(),
            run_budget_secs: default_run_budget_secs(),
            max_pages: default_max_pages(),
            retries: default_retries(),
            mirror_workers: default_mirror_workers(),
            verbose: false,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("cafe-crawler").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("CAFE_STORE_URL") {
            self.store_url = Some(url);
        }

        if let Ok(key) = std::env::var("CAFE_STORE_KEY") {
            self.store_key = Some(key);
        }

        if let Ok(url) = std::env::var("CAFE_WEBDRIVER_URL") {
            self.webdriver_url = url;
        }

        if let Ok(dir) = std::env::var("CAFE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        if let Ok(budget) = std::env::var("CAFE_RUN_BUDGET_SECS") {
            if let Ok(b) = budget.parse() {
                self.run_budget_secs = b;
            }
        }

        self
    }
}
