//! Resale-value derivation from price data.
//!
//! The used/purchase price ratio maps to a 0-5 score:
//!
//! | ratio          | V |
//! |----------------|---|
//! | < 0.10         | 0 |
//! | [0.10, 0.25)   | 1 |
//! | [0.25, 0.40)   | 2 |
//! | [0.40, 0.60)   | 3 |
//! | [0.60, 0.80)   | 4 |
//! | >= 0.80        | 5 |

/// Lower bound of each score above zero, inclusive.
const THRESHOLDS: [(f64, i32); 5] = [(0.80, 5), (0.60, 4), (0.40, 3), (0.25, 2), (0.10, 1)];

/// Derive the resale score from a price pair.
///
/// Returns `None` unless both prices are finite and positive.
pub fn resale_value(purchase_price: f64, used_price: f64) -> Option<i32> {
    if !is_known_price(purchase_price) || !is_known_price(used_price) {
        return None;
    }
    Some(score_for_ratio(used_price / purchase_price))
}

/// Map a used/purchase ratio onto the 0-5 scale.
pub fn score_for_ratio(ratio: f64) -> i32 {
    THRESHOLDS
        .iter()
        .find(|(bound, _)| ratio >= *bound)
        .map(|(_, score)| *score)
        .unwrap_or(0)
}

fn is_known_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}
