//! HTML extraction: turns rendered menu pages into product records.
//!
//! Everything here is pure. The crawl driver feeds page source in and
//! gets records out; a selector that matches nothing reduces yield but
//! never invents a record or aborts a page.

use crate::model::ExtractedProduct;
use crate::sites::profile::{DetailStrategy, IdStrategy, SelectorChain, SiteProfile, UrlStrategy};
use scraper::selectable::Selectable;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Names longer than this are UI chrome or scraped garbage, not products.
pub const NAME_MAX_CHARS: usize = 100;

/// Menu-page furniture that sometimes matches product-name selectors.
const UI_CHROME: &[&str] = &["카테고리", "전체보기", "정렬", "더보기"];

/// Extracts every product from a listing page.
///
/// Containers come from the profile's container chain; a page where the
/// whole chain misses yields an empty list. Individual containers that
/// produce no usable name are skipped.
pub fn extract_listing(
    html: &str,
    profile: &SiteProfile,
    external_category: &str,
    page_url: &str,
) -> Vec<ExtractedProduct> {
    let doc = Html::parse_document(html);
    let containers = profile.containers.select_all(&doc);

    if containers.is_empty() {
        debug!(
            site = profile.site.slug(),
            chain = ?profile.containers.sources(),
            "no product containers on page"
        );
        return Vec::new();
    }

    let mut products = Vec::new();
    let mut skipped = 0usize;
    for container in &containers {
        match build_record(
            *container,
            profile,
            &profile.id,
            &profile.url,
            external_category,
            page_url,
        ) {
            Some(product) => products.push(product),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(site = profile.site.slug(), skipped, kept = products.len(), "dropped containers");
    }

    dedup_by_external_id(products)
}

/// Extracts the single product from a detail page.
///
/// Only meaningful for click-through profiles; returns `None` when the
/// profile extracts from listings or the detail container chain misses.
pub fn extract_detail(
    html: &str,
    profile: &SiteProfile,
    external_category: &str,
    page_url: &str,
) -> Option<ExtractedProduct> {
    let DetailStrategy::ClickThrough { container, .. } = &profile.detail else {
        return None;
    };

    let doc = Html::parse_document(html);
    let scope = container.select_first(&doc)?;
    build_record(scope, profile, &profile.id, &profile.url, external_category, page_url)
}

/// Counts listing containers without building records. Click-through
/// profiles use this to know how many cards to visit.
pub fn count_containers(html: &str, profile: &SiteProfile) -> usize {
    let doc = Html::parse_document(html);
    profile.containers.select_all(&doc).len()
}

/// Collects `(label, absolute url)` pairs from category index links.
pub fn discover_links(html: &str, links: &SelectorChain, page_url: &str) -> Vec<(String, String)> {
    let doc = Html::parse_document(html);
    let mut found = Vec::new();
    for link in links.select_all(&doc) {
        let label = normalize_ws(&link.text().collect::<String>());
        let href = link.value().attr("href").unwrap_or_default();
        if label.is_empty() || href.is_empty() || href.starts_with('#') {
            continue;
        }
        if let Some(url) = resolve_url(page_url, href) {
            found.push((label, url));
        }
    }
    found
}

/// Resolves the next-page href, if the page has one.
pub fn next_link(html: &str, links: &SelectorChain, page_url: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let link = links.select_first(&doc)?;
    let href = link.value().attr("href").filter(|h| !h.is_empty() && !h.starts_with('#'))?;
    resolve_url(page_url, href)
}

/// Reads the tab labels matched by a tab selector, in DOM order.
pub fn tab_labels(html: &str, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        warn!(css, "tab selector does not parse");
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    doc.select(&selector)
        .map(|tab| normalize_ws(&tab.text().collect::<String>()))
        .filter(|label| !label.is_empty())
        .collect()
}

/// Collapses duplicate external ids: the last-seen record wins but keeps
/// the first-seen position, so page order stays stable across re-listings.
pub fn dedup_by_external_id(products: Vec<ExtractedProduct>) -> Vec<ExtractedProduct> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<ExtractedProduct> = Vec::new();
    for product in products {
        match seen.get(&product.external_id) {
            Some(&slot) => out[slot] = product,
            None => {
                seen.insert(product.external_id.clone(), out.len());
                out.push(product);
            }
        }
    }
    out
}

fn build_record(
    scope: ElementRef<'_>,
    profile: &SiteProfile,
    id: &IdStrategy,
    url: &UrlStrategy,
    external_category: &str,
    page_url: &str,
) -> Option<ExtractedProduct> {
    let raw_name = text_from(scope, &profile.fields.name)?;
    let name_en = text_from(scope, &profile.fields.name_en);
    let name = subtract_nested_name(&raw_name, name_en.as_deref());

    if !is_valid_name(&name, &profile.denylist) {
        debug!(site = profile.site.slug(), %name, "rejected name");
        return None;
    }

    let description = text_from(scope, &profile.fields.description);
    let price = price_from(scope, &profile.fields.price);
    let external_image_url =
        image_from(scope, &profile.fields.image, page_url).unwrap_or_default();
    let external_id = external_id_from(scope, id, profile, &name, page_url);
    let external_url = external_url_from(scope, url, page_url, &external_id);

    Some(ExtractedProduct {
        name,
        name_en,
        description,
        price,
        external_image_url,
        category: profile.internal_category.clone(),
        external_category: external_category.to_string(),
        external_id,
        external_url,
    })
}

/// First matching element's text, whitespace-normalized. Empty text
/// counts as a miss.
fn text_from<'a, S>(scope: S, chain: &SelectorChain) -> Option<String>
where
    S: Selectable<'a> + Copy,
{
    let element = chain.select_first(scope)?;
    let text = normalize_ws(&element.text().collect::<String>());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn image_from(scope: ElementRef<'_>, chain: &SelectorChain, page_url: &str) -> Option<String> {
    let img = chain.select_first(scope)?;
    // Lazy-loaded images keep the real source off `src`
    let src = img
        .value()
        .attr("src")
        .filter(|s| !s.is_empty() && !s.starts_with("data:"))
        .or_else(|| img.value().attr("data-src"))
        .or_else(|| img.value().attr("data-original"))?;
    resolve_url(page_url, src)
}

fn price_from(scope: ElementRef<'_>, chain: &SelectorChain) -> Option<f64> {
    text_from(scope, chain).and_then(|text| parse_price(&text))
}

/// Parses "4,500원" style price text.
fn parse_price(text: &str) -> Option<f64> {
    let digits: String =
        text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().filter(|p| *p > 0.0)
}

/// Removes the nested English label from a combined display name.
///
/// Sites like Mega render `<b>딸기라떼<span class="eng">Strawberry
/// Latte</span></b>`, so the name text carries the English twice over.
fn subtract_nested_name(name: &str, name_en: Option<&str>) -> String {
    match name_en {
        Some(en) if !en.is_empty() && name != en && name.contains(en) => {
            normalize_ws(&name.replace(en, ""))
        }
        _ => name.to_string(),
    }
}

fn is_valid_name(name: &str, extra_denylist: &[String]) -> bool {
    if name.is_empty() || name.chars().count() > NAME_MAX_CHARS {
        return false;
    }
    if UI_CHROME.iter().any(|junk| name.contains(junk)) {
        return false;
    }
    if extra_denylist.iter().any(|junk| name.contains(junk.as_str())) {
        return false;
    }
    true
}

fn external_id_from(
    scope: ElementRef<'_>,
    strategy: &IdStrategy,
    profile: &SiteProfile,
    name: &str,
    page_url: &str,
) -> String {
    let native = match strategy {
        IdStrategy::Attr { chain, attr } => chain
            .select_first(scope)
            .and_then(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
        IdStrategy::LinkParam { chain, param } => chain
            .select_first(scope)
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| resolve_url(page_url, href))
            .and_then(|abs| query_param(&abs, param)),
        IdStrategy::UrlParam { param } => query_param(page_url, param),
        IdStrategy::Synthesized => None,
    };

    native.unwrap_or_else(|| synthesized_id(profile, name))
}

/// Fallback id for sites (or single records) without a native id.
/// Uses the internal category constant so a site-side label edit does
/// not churn every id; a product rename still does.
fn synthesized_id(profile: &SiteProfile, name: &str) -> String {
    format!("{}_{}_{}", profile.site.slug(), profile.internal_category, name)
}

fn external_url_from(
    scope: ElementRef<'_>,
    strategy: &UrlStrategy,
    page_url: &str,
    external_id: &str,
) -> String {
    match strategy {
        UrlStrategy::LinkHref(chain) => chain
            .select_first(scope)
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| resolve_url(page_url, href))
            .unwrap_or_else(|| page_url.to_string()),
        UrlStrategy::Template(template) => template.replace("{id}", external_id),
        UrlStrategy::CurrentPage => page_url.to_string(),
    }
}

fn resolve_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

fn query_param(url: &str, param: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == param)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
