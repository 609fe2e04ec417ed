//! Dollar amounts as shown to shoppers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Formats an amount as dollars with two decimal places, e.g. `$12.50`.
/// Half cents round away from zero.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Line total for `qty` units at `price`.
#[must_use]
pub fn line_total(price: Decimal, qty: u32) -> Decimal {
    price * Decimal::from(qty)
}
