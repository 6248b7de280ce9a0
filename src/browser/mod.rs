//! Browser session abstraction for the crawl driver.
//!
//! The crawl driver only speaks [`PageDriver`]; the production
//! implementation wraps a WebDriver session, tests use a scripted
//! in-memory driver.

pub mod webdriver;

#[cfg(test)]
pub mod scripted;

pub use webdriver::WebDriverSession;

use async_trait::async_trait;
use thiserror::Error;
use thirtyfour::error::WebDriverError;

/// Errors raised while driving a browser through a site.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("WebDriver error: {0}")]
    WebDriver(#[from] WebDriverError),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("page load timed out: {0}")]
    Timeout(String),
}

/// Minimal navigation surface the crawl driver needs from a browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to a URL and waits for the load to complete.
    async fn goto(&self, url: &str) -> Result<(), CrawlError>;

    /// The URL the browser currently shows.
    async fn current_url(&self) -> Result<String, CrawlError>;

    /// Source of the current page after scripts ran.
    async fn source(&self) -> Result<String, CrawlError>;

    /// Clicks the nth element matching a CSS selector.
    ///
    /// Returns `Ok(false)` when no such element exists or it is hidden
    /// or disabled; that is the crawl driver's stop signal, not an error.
    async fn try_click(&self, css: &str, nth: usize) -> Result<bool, CrawlError>;

    /// Navigates back in the session history.
    async fn back(&self) -> Result<(), CrawlError>;

    /// PNG screenshot of the current viewport.
    async fn screenshot_png(&self) -> Result<Vec<u8>, CrawlError>;
}
