//! WebDriver-backed browser session.

use crate::browser::{CrawlError, PageDriver};
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;
use tracing::{debug, warn};

/// A live headless Chrome session behind a WebDriver endpoint.
///
/// The session holds a real browser process; callers must always reach
/// [`WebDriverSession::quit`], including on error paths, or the browser
/// leaks until the WebDriver server reaps it.
pub struct WebDriverSession {
    driver: WebDriver,
}

impl WebDriverSession {
    /// Connects to a WebDriver endpoint and starts a headless session.
    pub async fn launch(webdriver_url: &str, page_timeout: Duration) -> Result<Self, CrawlError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.set_headless()?;
        caps.set_no_sandbox()?;
        caps.set_disable_dev_shm_usage()?;
        caps.add_arg("--window-size=1440,1080")?;
        caps.add_arg("--lang=ko-KR")?;

        debug!(webdriver_url, "starting browser session");
        let driver = WebDriver::new(webdriver_url, caps).await?;
        driver.set_page_load_timeout(page_timeout).await?;

        Ok(Self { driver })
    }

    /// Ends the session and closes the browser.
    pub async fn quit(self) -> Result<(), CrawlError> {
        self.driver.quit().await?;
        Ok(())
    }
}

#[async_trait]
impl PageDriver for WebDriverSession {
    async fn goto(&self, url: &str) -> Result<(), CrawlError> {
        debug!(url, "goto");
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, CrawlError> {
        let url = self.driver.current_url().await?;
        Ok(url.to_string())
    }

    async fn source(&self) -> Result<String, CrawlError> {
        Ok(self.driver.source().await?)
    }

    async fn try_click(&self, css: &str, nth: usize) -> Result<bool, CrawlError> {
        let elements = self.driver.find_all(By::Css(css)).await?;
        let Some(element) = elements.get(nth) else {
            debug!(css, nth, found = elements.len(), "click target absent");
            return Ok(false);
        };

        // Stale or detached elements read as unclickable, same as hidden.
        if !element.is_displayed().await.unwrap_or(false)
            || !element.is_enabled().await.unwrap_or(false)
        {
            debug!(css, nth, "click target hidden or disabled");
            return Ok(false);
        }

        element.click().await?;
        Ok(true)
    }

    async fn back(&self) -> Result<(), CrawlError> {
        self.driver.back().await?;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, CrawlError> {
        match self.driver.screenshot_as_png().await {
            Ok(png) => Ok(png),
            Err(err) => {
                warn!(%err, "screenshot failed");
                Err(CrawlError::WebDriver(err))
            }
        }
    }
}
