use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

// Cent-rounding the payment perturbs the closed-form term solution by far
// less than this slack; exact integer terms must not ceil to the next period.
const TERM_ROUND_TOLERANCE: Decimal = dec!(0.001);

/// Fixed periodic payment for a fully amortizing loan:
/// `PMT = balance × r × (1+r)^n / ((1+r)^n − 1)`.
///
/// With `r == 0` the loan is straight-line: `PMT = balance / n`.
pub fn periodic_payment(
    balance: Money,
    periodic_rate: Rate,
    periods: u32,
) -> MortgageResult<Money> {
    if balance <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if periods == 0 {
        return Err(MortgageError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if periodic_rate < Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Periodic rate must not be negative".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(balance / Decimal::from(periods));
    }

    let one_plus_r = Decimal::ONE + periodic_rate;
    let factor = one_plus_r.powd(Decimal::from(periods));

    Ok(balance * periodic_rate * factor / (factor - Decimal::ONE))
}

/// Remaining whole periods needed to retire `balance` with a fixed `payment`:
/// `n = −ln(1 − balance × r / payment) / ln(1 + r)`, rounded up and clamped
/// to at least 1.
///
/// Fails with `NonAmortizingLoan` when the payment does not exceed the
/// per-period interest: no finite term retires such a loan.
pub fn remaining_periods(
    balance: Money,
    periodic_rate: Rate,
    payment: Money,
) -> MortgageResult<u32> {
    if balance <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "balance".into(),
            reason: "Balance must be positive".into(),
        });
    }
    if payment <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "payment".into(),
            reason: "Payment must be positive".into(),
        });
    }
    if periodic_rate < Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Periodic rate must not be negative".into(),
        });
    }

    if periodic_rate.is_zero() {
        let n = (balance / payment).ceil();
        return to_whole_periods(n);
    }

    let interest_only = balance * periodic_rate;
    if payment <= interest_only {
        return Err(MortgageError::NonAmortizingLoan {
            balance,
            periodic_rate,
            payment,
        });
    }

    let one_plus_r = Decimal::ONE + periodic_rate;
    // payment > interest_only guarantees the log argument is in (0, 1]
    let log_arg = Decimal::ONE - interest_only / payment;
    let n = (-log_arg.ln() / one_plus_r.ln() - TERM_ROUND_TOLERANCE).ceil();

    to_whole_periods(n)
}

fn to_whole_periods(n: Decimal) -> MortgageResult<u32> {
    let n = n.max(Decimal::ONE);
    n.to_u32().ok_or_else(|| MortgageError::InvalidInput {
        field: "payment".into(),
        reason: format!("Remaining term of {n} periods exceeds the supported range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_30yr_mortgage() {
        // $750k at 6.5% over 360 months, expected ~$4,740/mo
        let payment = periodic_payment(dec!(750000), dec!(0.065) / dec!(12), 360).unwrap();
        assert!(
            payment > dec!(4700) && payment < dec!(4800),
            "Monthly payment {} outside expected range",
            payment
        );
    }

    #[test]
    fn test_payment_zero_rate_straight_line() {
        let payment = periodic_payment(dec!(360000), Decimal::ZERO, 360).unwrap();
        // $360k / 360 months = $1000/mo
        assert_eq!(payment, dec!(1000));
    }

    #[test]
    fn test_payment_rejects_bad_domain() {
        assert!(periodic_payment(dec!(0), dec!(0.005), 300).is_err());
        assert!(periodic_payment(dec!(-100), dec!(0.005), 300).is_err());
        assert!(periodic_payment(dec!(100000), dec!(0.005), 0).is_err());
        assert!(periodic_payment(dec!(100000), dec!(-0.005), 300).is_err());
    }

    #[test]
    fn test_remaining_periods_round_trip() {
        // Payment derived from a 300-period loan should solve back to 300
        let r = dec!(0.055) / dec!(12);
        let payment = periodic_payment(dec!(960000), r, 300).unwrap();
        let n = remaining_periods(dec!(960000), r, payment).unwrap();
        assert_eq!(n, 300);
    }

    #[test]
    fn test_remaining_periods_round_trip_with_rounded_payment() {
        // Cent-rounded contractual payment must not shift the whole-period count
        let r = dec!(0.055) / dec!(12);
        let payment = periodic_payment(dec!(960000), r, 300)
            .unwrap()
            .round_dp(2);
        let n = remaining_periods(dec!(960000), r, payment).unwrap();
        assert_eq!(n, 300);
    }

    #[test]
    fn test_remaining_periods_partial_final_period_rounds_up() {
        // 10,000 at 1% per period with a 1,000 payment retires in 10.58
        // periods, so 11 whole periods
        let n = remaining_periods(dec!(10000), dec!(0.01), dec!(1000)).unwrap();
        assert_eq!(n, 11);
    }

    #[test]
    fn test_remaining_periods_zero_rate() {
        // ceil(2500 / 400) = 7
        let n = remaining_periods(dec!(2500), Decimal::ZERO, dec!(400)).unwrap();
        assert_eq!(n, 7);
    }

    #[test]
    fn test_remaining_periods_clamped_to_one() {
        // Payment larger than the balance clears it in a single period
        let n = remaining_periods(dec!(500), dec!(0.004), dec!(10000)).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_non_amortizing_interest_only_payment() {
        // Interest-only amount is 500,000 × 0.004 = 2,000; a 1,900 payment
        // never touches principal
        let result = remaining_periods(dec!(500000), dec!(0.004), dec!(1900));
        match result {
            Err(MortgageError::NonAmortizingLoan { payment, .. }) => {
                assert_eq!(payment, dec!(1900));
            }
            other => panic!("Expected NonAmortizingLoan, got {other:?}"),
        }
    }

    #[test]
    fn test_non_amortizing_exact_interest_payment() {
        // Payment exactly equal to interest is still non-amortizing
        let result = remaining_periods(dec!(500000), dec!(0.004), dec!(2000));
        assert!(matches!(
            result,
            Err(MortgageError::NonAmortizingLoan { .. })
        ));
    }
}
