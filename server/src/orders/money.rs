//! Money calculation utilities using rust_decimal for precision
//!
//! Prices are stored as `f64`; every sum and product goes through `Decimal`
//! and is rounded to 2 decimal places (half-up) before going back to `f64`.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculations
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

#[inline]
fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `unit_price * quantity`, rounded
pub fn line_total(unit_price: f64, quantity: i64) -> Decimal {
    round(to_decimal(unit_price) * Decimal::from(quantity))
}

/// Sum of already rounded line totals
pub fn order_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round(lines.into_iter().sum())
}
