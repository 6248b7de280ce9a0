//! Crawl command: drives a browser over café menu sites and writes
//! batch files.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::browser::{PageDriver, WebDriverSession};
use crate::config::Config;
use crate::crawl::{CrawlLimits, Crawler, OutputWriter};
use crate::format::Formatter;
use crate::sites::{self, SiteId};

/// Executes menu crawls.
pub struct CrawlCommand {
    config: Config,
}

impl CrawlCommand {
    /// Creates a new crawl command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Crawls one site, or every known site when `site` is "all".
    pub async fn execute(&self, site: &str, output: Option<&Path>) -> Result<String> {
        let targets: Vec<SiteId> = if site.eq_ignore_ascii_case("all") {
            SiteId::all().to_vec()
        } else {
            vec![site.parse()?]
        };

        let output_dir = output.unwrap_or(&self.config.output_dir);
        let writer = OutputWriter::new(output_dir);
        let limits = CrawlLimits::from_config(&self.config);
        let formatter = Formatter::new(self.config.verbose);

        let mut summaries = Vec::with_capacity(targets.len());
        for target in targets {
            summaries.push(self.crawl_site(target, &writer, limits, &formatter).await?);
        }
        Ok(summaries.join("\n\n"))
    }

    /// Runs one site in a fresh browser session. The session is closed
    /// on every path, including crawl failures.
    async fn crawl_site(
        &self,
        site: SiteId,
        writer: &OutputWriter,
        limits: CrawlLimits,
        formatter: &Formatter,
    ) -> Result<String> {
        info!("Starting browser for {}", site.slug());
        let session = WebDriverSession::launch(
            &self.config.webdriver_url,
            Duration::from_secs(self.config.page_timeout_secs),
        )
        .await
        .with_context(|| {
            format!(
                "Failed to start browser session. Is chromedriver running at {}?",
                self.config.webdriver_url
            )
        })?;

        let outcome = self
            .crawl_with_driver(&session, site, writer, limits, formatter)
            .await;
        if let Err(err) = session.quit().await {
            warn!(%err, "browser session did not close cleanly");
        }
        outcome
    }

    async fn crawl_with_driver(
        &self,
        driver: &dyn PageDriver,
        site: SiteId,
        writer: &OutputWriter,
        limits: CrawlLimits,
        formatter: &Formatter,
    ) -> Result<String> {
        let report = Crawler::new(driver, sites::profile(site), limits).run().await;

        // An empty harvest usually means selector rot; keep a screenshot
        // around for diagnosis.
        if report.products.is_empty() {
            match driver.screenshot_png().await {
                Ok(png) => {
                    if let Err(err) = writer.write_debug_screenshot(site.slug(), &png) {
                        warn!(%err, "could not save debug screenshot");
                    }
                }
                Err(err) => warn!(%err, "debug screenshot failed"),
            }
        }

        let path = writer.write_batch(site.slug(), &report.products)?;
        Ok(formatter.crawl_summary(&report, &path))
    }
}
