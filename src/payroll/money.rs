use rust_decimal::{Decimal, RoundingStrategy};

/// Round half up (toward positive infinity on ties) to `dp` decimal places.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// Whole currency units.
pub fn round_money(value: Decimal) -> Decimal {
    round_half_up(value, 0)
}

pub fn round_hours(value: Decimal) -> Decimal {
    round_half_up(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ties_round_up() {
        assert_eq!(round_money(dec!(2.5)), dec!(3));
        assert_eq!(round_money(dec!(2.4999)), dec!(2));
        assert_eq!(round_money(dec!(-2.5)), dec!(-2));
        assert_eq!(round_hours(dec!(1.005)), dec!(1.01));
        assert_eq!(round_hours(dec!(0.333333)), dec!(0.33));
    }

    // Banker's rounding would give 2 here; invariant checks depend on half-up.
    #[test]
    fn differs_from_bankers_rounding() {
        assert_eq!(round_money(dec!(2.5)), dec!(3));
        assert_ne!(round_money(dec!(2.5)), dec!(2.5).round());
    }
}
