//! Monetary rounding and formatting helpers.
//!
//! All money math in this crate goes through `rust_decimal` — never binary
//! floats — and rounds half-up to 2 decimal places, matching how the
//! storefront itself quantizes prices. `10.005 * 0.9` must come out as an
//! exact decimal, not `9.0044999...`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::PricingError;

/// Rounds a monetary amount half-up to exactly 2 decimal places.
/// `40` comes back as `40.00`, so serialized prices always carry cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Formats a discount percentage for display, stripping trailing zeros and
/// a trailing decimal point: `15.00` → `"15"`, `10.50` → `"10.5"`,
/// `33.33` → `"33.33"`.
#[must_use]
pub fn format_discount(percentage: Decimal) -> String {
    round_money(percentage).normalize().to_string()
}

/// Derives a per-unit price: `price / measurement_value`, rounded half-up
/// to 2 decimal places. Used downstream to render e.g. a per-litre price
/// next to the bottle price.
///
/// # Errors
///
/// - [`PricingError::InvalidMeasurement`] — `measurement_value` is zero or
///   negative. Division by zero is surfaced, never silent infinity.
/// - [`PricingError::Overflow`] — the division overflowed.
pub fn per_measurement_price(
    product_id: &str,
    price: Decimal,
    measurement_value: Decimal,
) -> Result<Decimal, PricingError> {
    if measurement_value <= Decimal::ZERO {
        return Err(PricingError::InvalidMeasurement {
            product_id: product_id.to_string(),
            measurement_value,
        });
    }
    price
        .checked_div(measurement_value)
        .map(round_money)
        .ok_or_else(|| PricingError::Overflow {
            product_id: product_id.to_string(),
        })
}
