//! Turns raw scraped candidates into comparable products.

use crate::model::{Product, RawProduct};
use crate::parser::quantity;
use crate::scraper::sites;

/// Enriches a raw product with canonical volume, unit decomposition and
/// per-liter/per-unit prices. Returns `None` for `price <= 0`: such a
/// record carries no economic information and is dropped before ranking
/// and persistence.
pub fn normalize(raw: RawProduct) -> Option<Product> {
    if raw.price <= 0.0 {
        return None;
    }

    let mut liter_value = quantity::parse_volume(&raw.volume);
    if liter_value == 0.0 {
        liter_value = quantity::parse_volume(&raw.name);
    }

    // Stores that ship no volume field get a display string synthesized
    // from whatever the name yielded.
    let volume = if raw.volume.is_empty() {
        if liter_value < 1.0 {
            format!("{}cl", (liter_value * 100.0) as i64)
        } else {
            format!("{liter_value:.1}L")
        }
    } else {
        raw.volume.clone()
    };

    let mut unit_count = quantity::parse_unit_count(&raw.volume);
    if unit_count == 1 {
        unit_count = quantity::parse_unit_count(&raw.name);
    }

    let (mut unit_size, mut unit_type) = quantity::parse_unit_size(&raw.volume);
    if unit_size == 0.0 {
        (unit_size, unit_type) = quantity::parse_unit_size(&raw.name);
    }

    let price_per_unit = if unit_count > 1 {
        raw.price / unit_count as f64
    } else {
        raw.price
    };

    Some(Product {
        logo: sites::logo_for(&raw.store).to_string(),
        price_per_liter: quantity::price_per_liter(raw.price, &raw.volume, &raw.name),
        liter_value,
        unit_count,
        unit_size,
        unit_type,
        price_per_unit,
        store: raw.store,
        name: raw.name,
        price: raw.price,
        volume,
        image: raw.image,
        link: raw.link,
    })
}
