//! Starbucks Korea drink menu profile.
//!
//! The list page renders every drink in one long `li.menuDataSet` list,
//! so there is no pagination and no category discovery. Product codes
//! live on the `prod` attribute of the detail-view anchor.

use crate::sites::profile::{
    CategoryDiscovery, DetailStrategy, FieldSelectors, IdStrategy, PaginationStrategy,
    SelectorChain, SiteProfile, UrlStrategy,
};
use crate::sites::SiteId;

pub(crate) fn profile() -> SiteProfile {
    SiteProfile {
        site: SiteId::Starbucks,
        entry_url: "https://www.starbucks.co.kr/menu/drink_list.do".to_string(),
        default_category: "음료".to_string(),
        internal_category: "음료".to_string(),
        settle_ms: 2500,
        containers: SelectorChain::new(&[
            "li.menuDataSet",
            "ul.product_list li",
            ".menu_list li",
        ]),
        fields: FieldSelectors {
            name: SelectorChain::new(&["dd", ".menu_name"]),
            name_en: SelectorChain::none(),
            description: SelectorChain::none(),
            price: SelectorChain::none(),
            image: SelectorChain::new(&["dt a img", "a img", "img"]),
        },
        id: IdStrategy::Attr {
            chain: SelectorChain::new(&["a.goDrinkView", "a[prod]"]),
            attr: "prod".to_string(),
        },
        url: UrlStrategy::Template(
            "https://www.starbucks.co.kr/menu/drink_view.do?product_cd={id}".to_string(),
        ),
        categories: CategoryDiscovery::EntryOnly,
        pagination: PaginationStrategy::SinglePage,
        detail: DetailStrategy::Listing,
        denylist: vec!["나만의 메뉴".to_string()],
    }
}
