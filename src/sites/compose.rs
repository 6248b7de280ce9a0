//! Compose Coffee menu profile.
//!
//! Menu categories hang off an index page as plain links and each
//! category is a paginated board. Items link to detail boards whose
//! `wr_id` parameter is the only stable id the site exposes.

use crate::sites::profile::{
    CategoryDiscovery, DetailStrategy, FieldSelectors, IdStrategy, PaginationStrategy,
    SelectorChain, SiteProfile, UrlStrategy,
};
use crate::sites::SiteId;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        site: SiteId::Compose,
        entry_url: "https://composecoffee.com/menu".to_string(),
        default_category: "음료".to_string(),
        internal_category: "음료".to_string(),
        settle_ms: 1500,
        containers: SelectorChain::new(&[
            "ul.prd-list li.item",
            ".itemBox",
            "ul.menu_list li",
        ]),
        fields: FieldSelectors {
            name: SelectorChain::new(&["p.title", ".title h3", ".prd_name"]),
            name_en: SelectorChain::new(&["p.title span.eng", ".title .en"]),
            description: SelectorChain::new(&[".txt", ".prd_desc"]),
            price: SelectorChain::new(&[".price", ".prd_price"]),
            image: SelectorChain::new(&[".img img", ".thumb img", "img"]),
        },
        id: IdStrategy::LinkParam {
            chain: SelectorChain::new(&["a"]),
            param: "wr_id".to_string(),
        },
        url: UrlStrategy::LinkHref(SelectorChain::new(&["a"])),
        categories: CategoryDiscovery::Links {
            index_url: "https://composecoffee.com/menu".to_string(),
            links: SelectorChain::new(&[
                ".menu-category a",
                "ul.category-list li a",
                ".tab_tit a",
            ]),
        },
        pagination: PaginationStrategy::NextLink {
            links: SelectorChain::new(&[
                ".pagination a[rel='next']",
                ".pg_wrap a.pg_next",
                "a.next",
            ]),
        },
        detail: DetailStrategy::Listing,
        denylist: Vec::new(),
    }
}
