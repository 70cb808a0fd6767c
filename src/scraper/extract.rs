//! Shared DOM extraction for all store scrapers.
//!
//! Every field is read through an ordered list of fallback selectors so a
//! store redesigning one class name does not silently empty the results.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::model::RawProduct;

static PRICE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[.,]\d+|\d+)").unwrap());

const NAME_SELECTORS: &[&str] = &[
    ".product-name",
    ".product-title",
    ".product-card__title",
    ".product-item-link",
    "h3",
    "h2",
    "a[class*='title']",
    "a[class*='name']",
];

const PRICE_SELECTORS: &[&str] = &[".price", "[class*='price']", "[data-testid='price']"];

const VOLUME_SELECTORS: &[&str] = &["[class*='volume']", "[class*='unit']", "[class*='quantity']"];

/// Parses the page and extracts one raw product per card. The card
/// selectors are tried in order; the first one yielding at least one
/// element wins, the rest are ignored.
pub fn extract_products(
    html: &str,
    store: &str,
    base_url: &str,
    card_selectors: &[&str],
) -> Vec<RawProduct> {
    let document = Html::parse_document(html);

    for selector in card_selectors {
        let Ok(cards) = Selector::parse(selector) else { continue };
        let elements: Vec<ElementRef> = document.select(&cards).collect();
        if elements.is_empty() {
            continue;
        }
        return elements
            .into_iter()
            .map(|card| extract_card(card, store, base_url))
            .filter(|p| !p.name.is_empty())
            .collect();
    }

    Vec::new()
}

fn extract_card(card: ElementRef, store: &str, base_url: &str) -> RawProduct {
    let name = select_text(card, NAME_SELECTORS).unwrap_or_default();
    let price = select_text(card, PRICE_SELECTORS)
        .map(|t| extract_price(&t))
        .unwrap_or(0.0);
    let volume = select_text(card, VOLUME_SELECTORS).unwrap_or_default();

    let link = select_first(card, &["a"])
        .and_then(|a| a.value().attr("href"))
        .map(|href| complete_url(href, base_url))
        .unwrap_or_default();

    // Lazy-loaded images keep the real source in data-src.
    let image = select_first(card, &["img"])
        .and_then(|img| {
            img.value()
                .attr("data-src")
                .filter(|src| !src.is_empty())
                .or_else(|| img.value().attr("src"))
        })
        .map(|src| complete_url(src, base_url))
        .unwrap_or_default();

    RawProduct {
        store: store.to_string(),
        name,
        price,
        volume,
        image,
        link,
    }
}

fn select_first<'a>(element: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    for selector in selectors {
        let Ok(sel) = Selector::parse(selector) else { continue };
        if let Some(found) = element.select(&sel).next() {
            return Some(found);
        }
    }
    None
}

fn select_text(element: ElementRef, selectors: &[&str]) -> Option<String> {
    select_first(element, selectors).map(|el| el.text().collect::<String>().trim().to_string())
}

/// Pulls the first numeric value out of a price string like "€ 1,99\n".
/// Unparsable text yields 0.0, which the normalizer later drops.
pub fn extract_price(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let cleaned = text.replace('\n', "").replace('€', "").replace(',', ".");
    let cleaned = cleaned.trim();

    PRICE_NUMBER
        .find(cleaned)
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
        .unwrap_or(0.0)
}

/// Completes a possibly-relative URL against the store's origin.
pub fn complete_url(url: &str, base_url: &str) -> String {
    if url.is_empty() {
        String::new()
    } else if url.starts_with("http") {
        url.to_string()
    } else if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else if url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), url)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), url)
    }
}
