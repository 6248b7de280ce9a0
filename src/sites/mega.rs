//! Mega Coffee menu profile.
//!
//! One entry page with category tabs and a scripted pager. Titles carry
//! the English name inline, so the extractor subtracts the nested
//! English node from the Korean display name. Items open in overlays
//! and have no ids or detail URLs of their own.

use crate::sites::profile::{
    CategoryDiscovery, DetailStrategy, FieldSelectors, IdStrategy, PaginationStrategy,
    SelectorChain, SiteProfile, UrlStrategy,
};
use crate::sites::SiteId;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        site: SiteId::Mega,
        entry_url: "https://www.mega-mgccoffee.com/menu/?menu_category1=1".to_string(),
        default_category: "전체 메뉴".to_string(),
        internal_category: "음료".to_string(),
        settle_ms: 2000,
        containers: SelectorChain::new(&[
            "#menu_list li.menu_list_item",
            "ul.cont_list li",
            "#menu_list li",
        ]),
        fields: FieldSelectors {
            name: SelectorChain::new(&[".cont_text_title b", ".cont_text_title"]),
            name_en: SelectorChain::new(&[".cont_text_title span.eng", ".cont_text_inner .eng"]),
            description: SelectorChain::new(&[".cont_text_info", ".cont_list_txt"]),
            price: SelectorChain::none(),
            image: SelectorChain::new(&[".menu_list_img img", ".cont_img img", "img"]),
        },
        id: IdStrategy::Synthesized,
        url: UrlStrategy::Template(
            "https://www.mega-mgccoffee.com/menu/?menu_category1=1".to_string(),
        ),
        categories: CategoryDiscovery::Tabs { css: "#menu_category_tab a".to_string() },
        pagination: PaginationStrategy::NextClick {
            css: "#board_page a.board_page_next:not(.disabled)".to_string(),
        },
        detail: DetailStrategy::Listing,
        denylist: vec!["자세히 보기".to_string()],
    }
}
