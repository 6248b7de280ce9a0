//! Navigation state machine for a single crawl run.
//!
//! A run walks one site profile: discover categories, page through each
//! category, extract products from listing pages (or click through to
//! detail pages where the site hides content behind them), and return
//! everything harvested. Page failures are retried a bounded number of
//! times and then skipped; the run itself never aborts, it returns what
//! it managed to collect.

use std::time::{Duration, Instant};

use rand::RngExt;
use tracing::{debug, info, warn};

use crate::browser::{CrawlError, PageDriver};
use crate::config::Config;
use crate::extract;
use crate::model::ExtractedProduct;
use crate::sites::{
    CategoryDiscovery, DetailStrategy, PaginationStrategy, SiteProfile,
};

/// Bounds on a crawl run. Each bound fails soft: hitting it skips or
/// truncates rather than aborting the run.
#[derive(Debug, Clone, Copy)]
pub struct CrawlLimits {
    /// Timeout for a single page load or source read.
    pub page_timeout: Duration,
    /// Wall-clock budget for the whole run.
    pub run_budget: Duration,
    /// Ceiling on listing pages per category.
    pub max_pages: u32,
    /// Retries after a failed page load before the category is skipped.
    pub retries: u32,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            page_timeout: Duration::from_secs(30),
            run_budget: Duration::from_secs(600),
            max_pages: 50,
            retries: 2,
        }
    }
}

impl CrawlLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            run_budget: Duration::from_secs(config.run_budget_secs),
            max_pages: config.max_pages,
            retries: config.retries,
        }
    }
}

/// What a crawl run produced.
#[derive(Debug)]
pub struct CrawlReport {
    pub site: String,
    pub products: Vec<ExtractedProduct>,
    /// Category labels that were actually opened, in crawl order.
    pub categories: Vec<String>,
    pub pages_visited: u32,
    /// Pages or categories given up on after retries.
    pub failures: u32,
    /// True when the run budget expired before the site was fully walked.
    pub budget_exhausted: bool,
}

/// How to reach one category's first listing page.
enum CategoryNav {
    /// Navigate straight to a URL.
    Goto { label: String, url: String },
    /// Click the nth tab on the entry page.
    Tab { label: String, index: usize, css: String },
}

impl CategoryNav {
    fn label(&self) -> &str {
        match self {
            CategoryNav::Goto { label, .. } => label,
            CategoryNav::Tab { label, .. } => label,
        }
    }
}

pub struct Crawler<'a> {
    driver: &'a dyn PageDriver,
    profile: &'a SiteProfile,
    limits: CrawlLimits,
    deadline: Instant,
    products: Vec<ExtractedProduct>,
    report: CrawlReport,
}

impl<'a> Crawler<'a> {
    pub fn new(driver: &'a dyn PageDriver, profile: &'a SiteProfile, limits: CrawlLimits) -> Self {
        let report = CrawlReport {
            site: profile.site.slug().to_string(),
            products: Vec::new(),
            categories: Vec::new(),
            pages_visited: 0,
            failures: 0,
            budget_exhausted: false,
        };
        Self {
            driver,
            profile,
            limits,
            deadline: Instant::now() + limits.run_budget,
            products: Vec::new(),
            report,
        }
    }

    /// Walks the whole site and returns everything harvested. Never
    /// fails: unreachable pages are counted and skipped.
    pub async fn run(mut self) -> CrawlReport {
        info!(site = %self.report.site, "starting crawl");
        let categories = self.discover_categories().await;
        for nav in categories {
            if self.out_of_budget() {
                break;
            }
            self.crawl_category(nav).await;
        }
        self.report.products = extract::dedup_by_external_id(std::mem::take(&mut self.products));
        info!(
            site = %self.report.site,
            products = self.report.products.len(),
            pages = self.report.pages_visited,
            failures = self.report.failures,
            "crawl finished"
        );
        self.report
    }

    /// Resolves the profile's discovery strategy into concrete category
    /// navigations. Discovery failures degrade to crawling the entry
    /// page as a single unnamed category.
    async fn discover_categories(&mut self) -> Vec<CategoryNav> {
        let profile = self.profile;
        let fallback = vec![CategoryNav::Goto {
            label: profile.default_category.clone(),
            url: profile.entry_url.clone(),
        }];
        match &profile.categories {
            CategoryDiscovery::EntryOnly => fallback,
            CategoryDiscovery::Fixed(pages) => pages
                .iter()
                .map(|page| CategoryNav::Goto {
                    label: page.label.clone(),
                    url: page.url.clone(),
                })
                .collect(),
            CategoryDiscovery::Links { index_url, links } => {
                match self.load_page(index_url).await {
                    Ok(html) => {
                        let found = extract::discover_links(&html, links, index_url);
                        if found.is_empty() {
                            debug!("no category links found, crawling the entry page");
                            fallback
                        } else {
                            found
                                .into_iter()
                                .map(|(label, url)| CategoryNav::Goto { label, url })
                                .collect()
                        }
                    }
                    Err(err) => {
                        warn!(url = %index_url, %err, "category index unreachable");
                        self.report.failures += 1;
                        fallback
                    }
                }
            }
            CategoryDiscovery::Tabs { css } => match self.load_page(&profile.entry_url).await {
                Ok(html) => {
                    let labels = extract::tab_labels(&html, css);
                    if labels.is_empty() {
                        debug!("no category tabs found, crawling the entry page");
                        fallback
                    } else {
                        labels
                            .into_iter()
                            .enumerate()
                            .map(|(index, label)| CategoryNav::Tab {
                                label,
                                index,
                                css: css.clone(),
                            })
                            .collect()
                    }
                }
                Err(err) => {
                    warn!(url = %profile.entry_url, %err, "entry page unreachable");
                    self.report.failures += 1;
                    fallback
                }
            },
        }
    }

    async fn crawl_category(&mut self, nav: CategoryNav) {
        let label = nav.label().to_string();
        debug!(category = %label, "opening category");
        let reached = match &nav {
            CategoryNav::Goto { url, .. } => self.goto_with_retries(url).await.map(|()| true),
            CategoryNav::Tab { index, css, .. } => self.open_tab(css, *index).await,
        };
        match reached {
            Ok(true) => {}
            Ok(false) => {
                warn!(category = %label, "category tab not clickable, skipping");
                self.report.failures += 1;
                return;
            }
            Err(err) => {
                warn!(category = %label, %err, "could not open category, skipping");
                self.report.failures += 1;
                return;
            }
        }
        self.report.categories.push(label.clone());
        self.crawl_pages(&label).await;
    }

    /// Tabs live on the entry page; reload it first so pager state from
    /// the previous tab does not leak into this one.
    async fn open_tab(&mut self, css: &str, index: usize) -> Result<bool, CrawlError> {
        let entry_url = self.profile.entry_url.clone();
        self.goto_with_retries(&entry_url).await?;
        if self.driver.try_click(css, index).await? {
            self.settle().await;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Pages through the current category until the pagination strategy
    /// stops, the page ceiling is hit, or the budget runs out.
    async fn crawl_pages(&mut self, category: &str) {
        let mut page: u32 = 1;
        loop {
            if self.out_of_budget() {
                break;
            }
            match self.harvest_current_page(category).await {
                Ok(count) => {
                    self.report.pages_visited += 1;
                    debug!(category, page, count, "page harvested");
                }
                Err(err) => {
                    warn!(category, page, %err, "page unreadable, skipping rest of category");
                    self.report.failures += 1;
                    break;
                }
            }
            if page >= self.limits.max_pages {
                debug!(category, ceiling = self.limits.max_pages, "page ceiling reached");
                break;
            }
            match self.advance(category).await {
                Ok(true) => page += 1,
                Ok(false) => break,
                Err(err) => {
                    warn!(category, %err, "pagination failed, keeping what we have");
                    self.report.failures += 1;
                    break;
                }
            }
        }
    }

    async fn harvest_current_page(&mut self, category: &str) -> Result<usize, CrawlError> {
        let profile = self.profile;
        match &profile.detail {
            DetailStrategy::Listing => {
                let page_url = self.driver.current_url().await?;
                let html = self.source_with_retries().await?;
                let mut items = extract::extract_listing(&html, profile, category, &page_url);
                let count = items.len();
                self.products.append(&mut items);
                Ok(count)
            }
            DetailStrategy::ClickThrough {
                link_css,
                url_pattern,
                ..
            } => {
                let link_css = link_css.clone();
                let url_pattern = url_pattern.clone();
                self.click_through(category, &link_css, &url_pattern).await
            }
        }
    }

    /// Visits each product card's detail page in turn and extracts from
    /// there. A detail URL that does not match the expected pattern is
    /// discarded without a record.
    async fn click_through(
        &mut self,
        category: &str,
        link_css: &str,
        url_pattern: &str,
    ) -> Result<usize, CrawlError> {
        let profile = self.profile;
        let listing_url = self.driver.current_url().await?;
        let listing_html = self.source_with_retries().await?;
        let total = extract::count_containers(&listing_html, profile);
        debug!(category, total, "visiting detail pages");
        let mut harvested = 0usize;
        for index in 0..total {
            if self.out_of_budget() {
                break;
            }
            match self.driver.try_click(link_css, index).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(category, index, "card link not clickable");
                    continue;
                }
                Err(err) => {
                    warn!(category, index, %err, "detail click failed");
                    self.report.failures += 1;
                    continue;
                }
            }
            self.settle().await;
            let detail_url = self.driver.current_url().await?;
            if !detail_url.contains(url_pattern) {
                debug!(category, url = %detail_url, "unexpected detail URL, discarding");
            } else {
                let html = self.source_with_retries().await?;
                match extract::extract_detail(&html, profile, category, &detail_url) {
                    Some(product) => {
                        self.products.push(product);
                        harvested += 1;
                    }
                    None => debug!(category, index, "detail page had no product"),
                }
            }
            self.return_to_listing(&listing_url, &detail_url).await?;
        }
        Ok(harvested)
    }

    async fn return_to_listing(
        &mut self,
        listing_url: &str,
        detail_url: &str,
    ) -> Result<(), CrawlError> {
        // An overlay that never left the listing needs no undo.
        if detail_url == listing_url {
            return Ok(());
        }
        self.driver.back().await?;
        self.settle().await;
        let now = self.driver.current_url().await?;
        if now != listing_url {
            self.goto_with_retries(listing_url).await?;
        }
        Ok(())
    }

    /// Moves to the next listing page. Ok(false) means the category is
    /// exhausted.
    async fn advance(&mut self, category: &str) -> Result<bool, CrawlError> {
        let profile = self.profile;
        match &profile.pagination {
            PaginationStrategy::SinglePage => Ok(false),
            PaginationStrategy::NextClick { css } => {
                if self.driver.try_click(css, 0).await? {
                    self.settle().await;
                    Ok(true)
                } else {
                    debug!(category, "no next control");
                    Ok(false)
                }
            }
            PaginationStrategy::NextLink { links } => {
                let page_url = self.driver.current_url().await?;
                let html = self.source_with_retries().await?;
                match extract::next_link(&html, links, &page_url) {
                    Some(next) if next != page_url => {
                        self.goto_with_retries(&next).await?;
                        Ok(true)
                    }
                    Some(_) => {
                        debug!(category, "next link loops back to the same page");
                        Ok(false)
                    }
                    None => {
                        debug!(category, "no next link");
                        Ok(false)
                    }
                }
            }
        }
    }

    async fn load_page(&mut self, url: &str) -> Result<String, CrawlError> {
        self.goto_with_retries(url).await?;
        self.source_with_retries().await
    }

    async fn goto_with_retries(&mut self, url: &str) -> Result<(), CrawlError> {
        let mut attempt: u32 = 0;
        loop {
            match tokio::time::timeout(self.limits.page_timeout, self.driver.goto(url)).await {
                Ok(Ok(())) => {
                    self.settle().await;
                    return Ok(());
                }
                Ok(Err(err)) => {
                    if attempt >= self.limits.retries {
                        return Err(err);
                    }
                    warn!(url, attempt, %err, "navigation failed, retrying");
                }
                Err(_) => {
                    if attempt >= self.limits.retries {
                        return Err(CrawlError::Timeout(url.to_string()));
                    }
                    warn!(url, attempt, "page load timed out, retrying");
                }
            }
            attempt += 1;
        }
    }

    async fn source_with_retries(&mut self) -> Result<String, CrawlError> {
        let mut attempt: u32 = 0;
        loop {
            match tokio::time::timeout(self.limits.page_timeout, self.driver.source()).await {
                Ok(Ok(html)) => return Ok(html),
                Ok(Err(err)) => {
                    if attempt >= self.limits.retries {
                        return Err(err);
                    }
                    warn!(attempt, %err, "reading page source failed, retrying");
                }
                Err(_) => {
                    if attempt >= self.limits.retries {
                        return Err(CrawlError::Timeout("page source".to_string()));
                    }
                    warn!(attempt, "reading page source timed out, retrying");
                }
            }
            attempt += 1;
        }
    }

    /// Waits for client-side rendering to catch up after a navigation
    /// or click. Profiles with `settle_ms` 0 skip the wait entirely.
    async fn settle(&self) {
        if self.profile.settle_ms == 0 {
            return;
        }
        let jitter: u64 = rand::rng().random_range(0..400);
        tokio::time::sleep(Duration::from_millis(self.profile.settle_ms + jitter)).await;
    }

    fn out_of_budget(&mut self) -> bool {
        if Instant::now() < self.deadline {
            return false;
        }
        if !self.report.budget_exhausted {
            self.report.budget_exhausted = true;
            warn!(
                site = %self.report.site,
                "run budget exhausted, returning partial results"
            );
        }
        true
    }
}
