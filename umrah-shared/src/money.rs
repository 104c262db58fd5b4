use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency used for every price the reference datasets carry.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Converts a major-unit amount (e.g. 1234.50 EUR) to minor units (123450).
///
/// Sub-cent fractions are rounded half away from zero, matching how the
/// payment processor rounds amounts it is handed.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
