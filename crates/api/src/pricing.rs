//! Pricing resolver.
//!
//! Computes the effective unit price of a cart line from its catalog pricing
//! snapshot. The source of each input is the catalog reader
//! ([`crate::db::catalog`]); this module is pure so that every line of an
//! order can be quoted against one shared instant and the arithmetic can be
//! tested without a database.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A percentage discount valid over a closed time interval.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountWindow {
    /// Percentage off, e.g. `10` for 10%.
    pub percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl DiscountWindow {
    /// Whether the discount applies at `now`.
    ///
    /// The interval is closed on both ends: a checkout at exactly the start
    /// or end instant still receives the discount.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// Catalog pricing inputs for one cart line.
///
/// `base_price` is already resolved by the catalog reader: the size-specific
/// price when the line picked a size, otherwise the product's minimum size
/// price, falling back to the product's own price when no size pricing
/// exists.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePricing {
    pub base_price: Decimal,
    pub discount: Option<DiscountWindow>,
}

/// The frozen pricing of a line at quote time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub base_price: Decimal,
    /// `0` when no discount was active.
    pub discount_percent: Decimal,
    /// Unit price after discount (equals `base_price` when none applied).
    pub unit_price: Decimal,
    /// `unit_price * qty`.
    pub subtotal: Decimal,
}

/// Quote one line at `now`.
///
/// Deterministic for identical inputs and identical `now`. Callers pricing a
/// whole order must pass the same `now` for every line so a discount boundary
/// cannot split an order into inconsistently priced items.
#[must_use]
pub fn quote(pricing: &LinePricing, qty: u32, now: DateTime<Utc>) -> PriceQuote {
    let active = pricing
        .discount
        .as_ref()
        .filter(|d| d.is_active_at(now));

    let discount_percent = active.map_or(Decimal::ZERO, |d| d.percent);
    let unit_price = pricing.base_price
        - pricing.base_price * discount_percent / Decimal::ONE_HUNDRED;

    PriceQuote {
        base_price: pricing.base_price,
        discount_percent,
        unit_price,
        subtotal: unit_price * Decimal::from(qty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn discounted(base: Decimal, percent: Decimal) -> LinePricing {
        LinePricing {
            base_price: base,
            discount: Some(DiscountWindow {
                percent,
                starts_at: at(1_000),
                ends_at: at(2_000),
            }),
        }
    }

    #[test]
    fn test_no_discount_quotes_base_price() {
        let pricing = LinePricing {
            base_price: dec!(50.00),
            discount: None,
        };
        let q = quote(&pricing, 1, at(1_500));
        assert_eq!(q.base_price, dec!(50.00));
        assert_eq!(q.discount_percent, Decimal::ZERO);
        assert_eq!(q.unit_price, dec!(50.00));
        assert_eq!(q.subtotal, dec!(50.00));
    }

    #[test]
    fn test_active_discount_applies_percent() {
        let q = quote(&discounted(dec!(100.00), dec!(10)), 2, at(1_500));
        assert_eq!(q.discount_percent, dec!(10));
        assert_eq!(q.unit_price, dec!(90.00));
        assert_eq!(q.subtotal, dec!(180.00));
    }

    #[test]
    fn test_discount_window_is_closed_at_both_ends() {
        let pricing = discounted(dec!(100.00), dec!(25));

        // Boundary instants count as active.
        assert_eq!(quote(&pricing, 1, at(1_000)).unit_price, dec!(75.00));
        assert_eq!(quote(&pricing, 1, at(2_000)).unit_price, dec!(75.00));

        // One second outside either end does not.
        assert_eq!(quote(&pricing, 1, at(999)).unit_price, dec!(100.00));
        assert_eq!(quote(&pricing, 1, at(2_001)).unit_price, dec!(100.00));
    }

    #[test]
    fn test_inactive_discount_reports_zero_percent() {
        let q = quote(&discounted(dec!(80.00), dec!(15)), 3, at(5_000));
        assert_eq!(q.discount_percent, Decimal::ZERO);
        assert_eq!(q.subtotal, dec!(240.00));
    }

    #[test]
    fn test_subtotal_scales_with_quantity() {
        let q = quote(&discounted(dec!(10.00), dec!(50)), 7, at(1_500));
        assert_eq!(q.unit_price, dec!(5.00));
        assert_eq!(q.subtotal, dec!(35.00));
    }

    #[test]
    fn test_quote_is_deterministic() {
        let pricing = discounted(dec!(42.42), dec!(12.5));
        let now = at(1_234);
        assert_eq!(quote(&pricing, 4, now), quote(&pricing, 4, now));
    }
}
