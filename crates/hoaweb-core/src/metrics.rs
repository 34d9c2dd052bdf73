//! Guarded ratio helpers
//!
//! Every ratio in the dashboard goes through here so a zero denominator
//! yields either `0` or `None`, never a panic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Largest amount accepted from an edit or a hand-off slot
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// `(to - from) / from * 100`, omitted when `from` is zero
pub fn percent_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    Some((to - from) / from * Decimal::ONE_HUNDRED)
}

/// Operating margin `net / income * 100`; 0 when there is no income
pub fn margin(net: Decimal, income: Decimal) -> Decimal {
    share(net, income)
}

/// `part / whole * 100`; 0 when `whole` is not positive
pub fn share(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}

/// Round half up to whole units
pub fn round_whole(value: Decimal) -> Decimal {
    (value + Decimal::new(5, 1)).floor()
}

/// Apply a growth rate: `value * (1 + rate)`
pub fn grow(value: Decimal, rate: Decimal) -> Decimal {
    value * (Decimal::ONE + rate)
}

/// Arithmetic mean; 0 for an empty slice
pub fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
}
