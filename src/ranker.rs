//! Orders products by effective price per liter.

use crate::model::Product;

/// Stand-in above any realistic price per liter, so volume-unknown
/// products sort last instead of being excluded.
const UNKNOWN_SENTINEL: f64 = 999.0;

fn effective_price_per_liter(product: &Product) -> f64 {
    if product.price_per_liter == 0.0 {
        UNKNOWN_SENTINEL
    } else {
        product.price_per_liter
    }
}

/// Sorts ascending by effective price per liter. The sort is stable, so
/// ties and the volume-unknown tail keep their prior relative order.
pub fn rank(products: &mut [Product]) {
    products.sort_by(|a, b| {
        effective_price_per_liter(a).total_cmp(&effective_price_per_liter(b))
    });
}
