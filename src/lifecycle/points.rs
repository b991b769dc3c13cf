//! Point-of-profit calculator — raw price difference, no pip scaling.
//!
//! Points are stored in raw price units; any 5-decimal "pip-like" rendering
//! is a display concern of the notifier and the browser.

use super::status::Direction;

/// Signed points for a trade with the given entry, marked at `reference`.
///
/// Fails soft: returns 0.0 when either price is missing (zero) or not a
/// finite number, so a half-populated trade never produces garbage P/L.
pub fn compute(direction: Direction, entry: f64, reference: f64) -> f64 {
    if entry == 0.0 || reference == 0.0 || !entry.is_finite() || !reference.is_finite() {
        return 0.0;
    }

    match direction {
        Direction::Buy => reference - entry,
        Direction::Sell => entry - reference,
    }
}

/// Which side of the quote marks a trade to market: buys exit on the bid,
/// sells on the ask.
pub fn reference_price(direction: Direction, bid: f64, ask: f64) -> f64 {
    match direction {
        Direction::Buy => bid,
        Direction::Sell => ask,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prices_yield_zero() {
        assert_eq!(compute(Direction::Buy, 0.0, 110.0), 0.0);
        assert_eq!(compute(Direction::Buy, 100.0, 0.0), 0.0);
        assert_eq!(compute(Direction::Sell, 0.0, 0.0), 0.0);
        assert_eq!(compute(Direction::Buy, f64::NAN, 110.0), 0.0);
    }

    #[test]
    fn buy_profits_when_price_rises() {
        assert_eq!(compute(Direction::Buy, 100.0, 110.0), 10.0);
        assert_eq!(compute(Direction::Buy, 100.0, 95.0), -5.0);
    }

    #[test]
    fn sell_profits_when_price_falls() {
        assert_eq!(compute(Direction::Sell, 100.0, 90.0), 10.0);
        assert_eq!(compute(Direction::Sell, 100.0, 104.0), -4.0);
    }

    #[test]
    fn raw_units_for_fx_sized_prices() {
        let pts = compute(Direction::Buy, 1.08500, 1.08550);
        assert!((pts - 0.00050).abs() < 1e-12);
    }

    #[test]
    fn buys_mark_on_bid_sells_on_ask() {
        assert_eq!(reference_price(Direction::Buy, 1.1000, 1.1002), 1.1000);
        assert_eq!(reference_price(Direction::Sell, 1.1000, 1.1002), 1.1002);
    }
}
