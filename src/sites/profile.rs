//! Declarative crawl profile types shared by all café brands.
//!
//! A profile describes where products live in a site's DOM and how the
//! crawler moves between pages. The crawl driver and the extractor only
//! ever read these descriptions; nothing in them executes site-specific
//! code.

use crate::sites::SiteId;
use scraper::selectable::Selectable;
use scraper::{ElementRef, Selector};

/// An ordered list of CSS selectors tried in priority order.
///
/// Sites restyle their menu pages without notice; each field keeps the
/// current markup first and older fallbacks behind it. The first selector
/// that matches anything wins, so a stale fallback can never override a
/// fresher hit.
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
    sources: Vec<String>,
}

impl SelectorChain {
    /// Compiles a chain from CSS source strings.
    ///
    /// Panics when a source does not parse; chains are built from vetted
    /// literals inside the per-site profiles.
    pub fn new(sources: &[&str]) -> Self {
        Self {
            selectors: sources.iter().map(|s| Selector::parse(s).unwrap()).collect(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// An empty chain; matches nothing.
    pub fn none() -> Self {
        Self { selectors: Vec::new(), sources: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// The CSS sources, for diagnostics.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns every element matched by the first selector that matches
    /// at all, in document order. An exhausted chain returns nothing.
    pub fn select_all<'a, S>(&self, scope: S) -> Vec<ElementRef<'a>>
    where
        S: Selectable<'a> + Copy,
    {
        for selector in &self.selectors {
            let matches: Vec<ElementRef<'a>> = scope.select(selector).collect();
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }

    /// Returns the first element of the first selector that matches.
    pub fn select_first<'a, S>(&self, scope: S) -> Option<ElementRef<'a>>
    where
        S: Selectable<'a> + Copy,
    {
        for selector in &self.selectors {
            if let Some(element) = scope.select(selector).next() {
                return Some(element);
            }
        }
        None
    }
}

/// Per-field selector chains applied inside a product container.
#[derive(Debug, Clone)]
pub struct FieldSelectors {
    pub name: SelectorChain,
    pub name_en: SelectorChain,
    pub description: SelectorChain,
    pub price: SelectorChain,
    pub image: SelectorChain,
}

/// How the external id is derived for a record.
#[derive(Debug, Clone)]
pub enum IdStrategy {
    /// Read an attribute off the first matching element, e.g. the
    /// `prod` code Starbucks puts on its detail-view anchors.
    Attr { chain: SelectorChain, attr: String },
    /// Take a query parameter from the first matching link's href.
    LinkParam { chain: SelectorChain, param: String },
    /// Take a query parameter from the page URL itself (detail pages).
    UrlParam { param: String },
    /// No native id on the site; synthesize `{site}_{category}_{name}`.
    Synthesized,
}

/// How the canonical product URL is derived.
#[derive(Debug, Clone)]
pub enum UrlStrategy {
    /// First matching link's href, resolved against the page URL.
    LinkHref(SelectorChain),
    /// Fixed template, `{id}` replaced by the external id. Sites that
    /// only show products in overlays use a template without `{id}`.
    Template(String),
    /// The URL of the page the record was extracted from.
    CurrentPage,
}

/// A fixed category page in a profile.
#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub label: String,
    pub url: String,
}

/// How the crawler finds the category pages of a site.
#[derive(Debug, Clone)]
pub enum CategoryDiscovery {
    /// The entry page is the whole menu.
    EntryOnly,
    /// A curated list of category URLs.
    Fixed(Vec<CategoryPage>),
    /// Collect category links from an index page.
    Links { index_url: String, links: SelectorChain },
    /// Click through in-page tabs on the entry page.
    Tabs { css: String },
}

/// How the crawler reaches the next listing page.
#[derive(Debug, Clone)]
pub enum PaginationStrategy {
    SinglePage,
    /// Click a next control in place. The selector should exclude the
    /// control's disabled state so the last page reads as "absent".
    NextClick { css: String },
    /// Follow the href of a next link.
    NextLink { links: SelectorChain },
}

/// Whether records come from the listing itself or from detail pages.
#[derive(Debug, Clone)]
pub enum DetailStrategy {
    /// Extract every record straight from the listing containers.
    Listing,
    /// Click each container's link, extract one record from the detail
    /// page, then navigate back. A click that does not land on a URL
    /// containing `url_pattern` yields nothing.
    ClickThrough { link_css: String, url_pattern: String, container: SelectorChain },
}

/// Complete crawl description for one café brand.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub site: SiteId,
    pub entry_url: String,
    /// Category label when discovery yields nothing.
    pub default_category: String,
    /// Coarse internal bucket stamped on every record of this site.
    pub internal_category: String,
    /// Wait after each navigation, before extraction. Zero disables it.
    pub settle_ms: u64,
    pub containers: SelectorChain,
    pub fields: FieldSelectors,
    pub id: IdStrategy,
    pub url: UrlStrategy,
    pub categories: CategoryDiscovery,
    pub pagination: PaginationStrategy,
    pub detail: DetailStrategy,
    /// Site-specific UI labels to reject on top of the global denylist.
    pub denylist: Vec<String>,
}
