//! The configured retail sources and their storefront metadata.

use reqwest::Client;
use std::sync::Arc;

use crate::scraper::fetcher::{SiteConfig, SiteScraper};
use crate::scraper::traits::StoreScraper;

const GENERIC_CARDS: &[&str] = &[".product-tile", ".product-card", "[data-testid='product']"];
const WOOCOMMERCE_CARDS: &[&str] = &[".product", ".product-small", ".woocommerce-loop-product"];

pub const SITES: &[SiteConfig] = &[
    SiteConfig {
        store: "Colruyt",
        base_url: "https://www.collectandgo.be",
        search_url: "https://www.collectandgo.be/nl/zoek",
        term_param: "searchTerm",
        extra_params: &[],
        card_selectors: &[".product-card", ".product-item", "article", "[data-testid='product']"],
    },
    SiteConfig {
        store: "Albert Heijn",
        base_url: "https://www.ah.be",
        search_url: "https://www.ah.be/zoeken",
        term_param: "query",
        extra_params: &[],
        card_selectors: &[".product-card", "[data-testid='product']", "article"],
    },
    SiteConfig {
        store: "Aldi",
        base_url: "https://www.aldi.be",
        search_url: "https://www.aldi.be/nl/zoekresultaten.html",
        term_param: "query",
        extra_params: &[("searchCategory", "Submitted Search")],
        card_selectors: &[".mod-article-tile"],
    },
    SiteConfig {
        store: "Delhaize",
        base_url: "https://www.delhaize.be",
        search_url: "https://www.delhaize.be/nl-be/search",
        term_param: "text",
        extra_params: &[],
        card_selectors: GENERIC_CARDS,
    },
    SiteConfig {
        store: "Lidl",
        base_url: "https://www.lidl.be",
        search_url: "https://www.lidl.be/nl/zoeken",
        term_param: "q",
        extra_params: &[],
        card_selectors: &[".product", ".product-grid-box", "[data-testid='product']"],
    },
    SiteConfig {
        store: "Jumbo",
        base_url: "https://www.jumbo.be",
        search_url: "https://www.jumbo.be/zoeken",
        term_param: "searchTerms",
        extra_params: &[],
        card_selectors: &[".product-container", ".jum-product-list-item", "[data-testid='product']"],
    },
    SiteConfig {
        store: "Carrefour",
        base_url: "https://www.carrefour.be",
        search_url: "https://www.carrefour.be/nl/search",
        term_param: "q",
        extra_params: &[],
        card_selectors: GENERIC_CARDS,
    },
    SiteConfig {
        store: "Prik&Tik",
        base_url: "https://www.prikentik.be",
        search_url: "https://www.prikentik.be/catalogsearch/result/",
        term_param: "q",
        extra_params: &[],
        card_selectors: &[".product-item", ".item", "[data-testid='product']"],
    },
    SiteConfig {
        store: "Snuffelstore",
        base_url: "https://www.snuffelstore.be",
        search_url: "https://www.snuffelstore.be/",
        term_param: "s",
        extra_params: &[("post_type", "product")],
        card_selectors: WOOCOMMERCE_CARDS,
    },
    SiteConfig {
        store: "Drinks Corner",
        base_url: "https://drinkscorner.be",
        search_url: "https://drinkscorner.be/",
        term_param: "s",
        extra_params: &[("post_type", "product")],
        card_selectors: WOOCOMMERCE_CARDS,
    },
];

/// One scraper per configured site, sharing a single HTTP client.
pub fn default_scrapers(client: &Client) -> Vec<Arc<dyn StoreScraper>> {
    SITES
        .iter()
        .map(|config| Arc::new(SiteScraper::new(client.clone(), *config)) as Arc<dyn StoreScraper>)
        .collect()
}

/// CDN logo for a store, empty for stores we carry no logo for.
pub fn logo_for(store: &str) -> &'static str {
    match store {
        "Colruyt" => "https://cdn.cookielaw.org/logos/01b5df24-cb0b-44a1-90e6-afd3f2e7bea0/36dcc7e0-97a6-422b-b3ad-c90e49082efd/91f51b8c-c0a7-4849-8b20-86e0fc38eeb7/Colruyt_Group_logo.png",
        "Albert Heijn" => "https://upload.wikimedia.org/wikipedia/commons/thumb/e/eb/Albert_Heijn_logo.svg/274px-Albert_Heijn_logo.svg.png",
        "Aldi" => "https://upload.wikimedia.org/wikipedia/commons/thumb/2/2c/Aldi_Nord_201x_logo.svg/256px-Aldi_Nord_201x_logo.svg.png",
        "Delhaize" => "https://static.delhaize.be/logo_delhaize.svg",
        "Lidl" => "https://upload.wikimedia.org/wikipedia/commons/thumb/9/91/Lidl-Logo.svg/1024px-Lidl-Logo.svg.png",
        "Jumbo" => "https://upload.wikimedia.org/wikipedia/commons/thumb/e/ee/Jumbo_Logo.svg/1200px-Jumbo_Logo.svg.png",
        "Carrefour" => "https://upload.wikimedia.org/wikipedia/commons/thumb/5/5b/Carrefour_logo.svg/1024px-Carrefour_logo.svg.png",
        "Prik&Tik" => "https://www.prikentik.be/static/version1733984638/frontend/PrikEnTik/default/nl_BE/images/logo.svg",
        "Snuffelstore" => "https://www.snuffelstore.be/wp-content/uploads/2021/04/snuffelstore-logo-1.png",
        "Drinks Corner" => "https://drinkscorner.be/wp-content/uploads/2023/10/DrinksCorner-Logo-web-150x64.png",
        _ => "",
    }
}
