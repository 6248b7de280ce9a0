//! Paik's Coffee (빽다방) menu profile.
//!
//! Listing cards carry only a thumbnail; names, descriptions, and the
//! `idx` id all live on the detail page, so this profile click-throughs
//! every card and extracts from the detail view.

use crate::sites::profile::{
    CategoryDiscovery, CategoryPage, DetailStrategy, FieldSelectors, IdStrategy,
    PaginationStrategy, SelectorChain, SiteProfile, UrlStrategy,
};
use crate::sites::SiteId;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        site: SiteId::Paik,
        entry_url: "https://paikdabang.com/menu/menu_coffee/".to_string(),
        default_category: "커피".to_string(),
        internal_category: "음료".to_string(),
        settle_ms: 1500,
        containers: SelectorChain::new(&["ul.menu_list li", ".menu_list2 li"]),
        fields: FieldSelectors {
            name: SelectorChain::new(&[".menu_view_tit h3", "h3.menu_tit", ".view_tit"]),
            name_en: SelectorChain::new(&[".menu_view_tit .eng", ".view_tit span.en"]),
            description: SelectorChain::new(&[".menu_view_txt", ".view_txt p"]),
            price: SelectorChain::none(),
            image: SelectorChain::new(&[".menu_view_img img", ".view_img img"]),
        },
        id: IdStrategy::UrlParam { param: "idx".to_string() },
        url: UrlStrategy::CurrentPage,
        categories: CategoryDiscovery::Fixed(vec![
            CategoryPage {
                label: "커피".to_string(),
                url: "https://paikdabang.com/menu/menu_coffee/".to_string(),
            },
            CategoryPage {
                label: "음료".to_string(),
                url: "https://paikdabang.com/menu/menu_drink/".to_string(),
            },
            CategoryPage {
                label: "빽스치노".to_string(),
                url: "https://paikdabang.com/menu/menu_ccino/".to_string(),
            },
        ]),
        pagination: PaginationStrategy::SinglePage,
        detail: DetailStrategy::ClickThrough {
            link_css: "ul.menu_list li a".to_string(),
            url_pattern: "idx=".to_string(),
            container: SelectorChain::new(&[".menu_view", ".view_wrap", "#menu_view"]),
        },
        denylist: Vec::new(),
    }
}
