//! Extracts volumes and pack sizes from product text.
//!
//! Retailers rarely agree on a format: a dedicated volume field may hold
//! "6 x 330 ml", the name may carry "1,5L", or neither may say anything.
//! A failed parse resolves to a sentinel (0 liters, 1 unit, empty unit
//! type), never an error.

use regex::Regex;
use std::sync::LazyLock;

/// Multi-pack quantity: "6 x 330 ml", "4x1.5l". Tried before the single
/// pattern so the trailing operand is never matched on its own.
static MULTI_PACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*x\s*([\d.]+)\s*(l|cl|ml)").unwrap());

/// Single quantity: "1.5 l", "330ml".
static SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*(l|cl|ml)").unwrap());

/// Lowercase and normalize the decimal comma so "1,5L" parses as 1.5 l.
fn canonicalize(text: &str) -> String {
    text.to_lowercase().replace(',', ".")
}

/// A single match directly after an "x" is the trailing operand of a
/// malformed multi-pack ("x330ml"); skip it rather than misread the size.
fn preceded_by_x(text: &str, start: usize) -> bool {
    text[..start].ends_with('x')
}

/// Converts an amount in the given unit to liters. Unknown units pass
/// through unconverted.
pub fn convert_to_liters(amount: f64, unit: &str) -> f64 {
    match unit.to_lowercase().as_str() {
        "ml" => amount / 1000.0,
        "cl" => amount / 100.0,
        _ => amount,
    }
}

/// Total volume in liters described by `text`, or 0.0 when no quantity
/// pattern matches. Multi-packs return count times size.
pub fn parse_volume(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let text = canonicalize(text);

    if let Some(caps) = MULTI_PACK.captures(&text) {
        let count: f64 = caps[1].parse().unwrap_or(0.0);
        let size: f64 = caps[2].parse().unwrap_or(0.0);
        return convert_to_liters(count * size, &caps[3]);
    }

    for caps in SINGLE.captures_iter(&text) {
        let Some(m) = caps.get(0) else { continue };
        if preceded_by_x(&text, m.start()) {
            continue;
        }
        let size: f64 = caps[1].parse().unwrap_or(0.0);
        return convert_to_liters(size, &caps[2]);
    }

    0.0
}

/// Number of sub-units in a multi-pack, 1 when the text describes a single
/// item or nothing at all.
pub fn parse_unit_count(text: &str) -> u32 {
    if text.is_empty() {
        return 1;
    }
    let text = canonicalize(text);

    match MULTI_PACK.captures(&text) {
        Some(caps) => caps[1].parse::<u32>().unwrap_or(1).max(1),
        None => 1,
    }
}

/// Per-unit size and uppercased unit type. For a multi-pack this is the
/// size of one sub-unit, not the total.
pub fn parse_unit_size(text: &str) -> (f64, String) {
    if text.is_empty() {
        return (0.0, String::new());
    }
    let text = canonicalize(text);

    if let Some(caps) = MULTI_PACK.captures(&text) {
        let size: f64 = caps[2].parse().unwrap_or(0.0);
        return (size, caps[3].to_uppercase());
    }

    for caps in SINGLE.captures_iter(&text) {
        let Some(m) = caps.get(0) else { continue };
        if preceded_by_x(&text, m.start()) {
            continue;
        }
        let size: f64 = caps[1].parse().unwrap_or(0.0);
        return (size, caps[2].to_uppercase());
    }

    (0.0, String::new())
}

/// Price per liter to two decimals, falling back to the product name when
/// the volume field yields nothing. 0.0 means undeterminable.
pub fn price_per_liter(price: f64, volume: &str, name: &str) -> f64 {
    let mut liters = parse_volume(volume);
    if liters == 0.0 {
        liters = parse_volume(name);
    }
    if liters == 0.0 {
        return 0.0;
    }
    ((price / liters) * 100.0).trunc() / 100.0
}
