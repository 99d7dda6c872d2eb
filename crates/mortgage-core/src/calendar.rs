use chrono::{Datelike, Duration, NaiveDate};

use crate::error::MortgageError;
use crate::types::PaymentFrequency;
use crate::MortgageResult;

// Weekly at 100k steps is ~1900 years; anything past this is bad input.
const MAX_LATTICE_STEPS: u32 = 100_000;

/// Calendar days between consecutive payments for day-stepped cadences.
/// Monthly and semi-monthly step by calendar months instead.
fn day_step(frequency: PaymentFrequency) -> Option<i64> {
    match frequency {
        PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => Some(7),
        PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => Some(14),
        PaymentFrequency::Monthly | PaymentFrequency::SemiMonthly => None,
    }
}

/// Add whole calendar months, clamping the day to the target month's end.
/// Always computed from the input date, so a day-31 anchor lands on the 28th
/// in February and back on the 31st in March.
pub fn add_months(date: NaiveDate, months: u32) -> MortgageResult<NaiveDate> {
    let total = date.month0() as i64 + months as i64;
    let year = date.year() as i64 + total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    let year = i32::try_from(year).map_err(|_| {
        MortgageError::DateOutOfRange(format!("{date} + {months} months overflows the calendar"))
    })?;

    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        MortgageError::DateOutOfRange(format!("{date} + {months} months overflows the calendar"))
    })
}

/// The `index`-th due date on the cadence lattice anchored at `anchor`
/// (index 0 is the anchor itself).
///
/// Weekly and biweekly cadences step by exact calendar days, so a schedule
/// anchored on a Monday only ever lands on Mondays. Semi-monthly payments
/// alternate between the anchor's day-of-month and 15 calendar days later.
pub fn due_date(
    anchor: NaiveDate,
    frequency: PaymentFrequency,
    index: u32,
) -> MortgageResult<NaiveDate> {
    match day_step(frequency) {
        Some(step) => anchor
            .checked_add_signed(Duration::days(step * index as i64))
            .ok_or_else(|| {
                MortgageError::DateOutOfRange(format!(
                    "{anchor} + {index} × {step} days overflows the calendar"
                ))
            }),
        None if frequency == PaymentFrequency::SemiMonthly => {
            let base = add_months(anchor, index / 2)?;
            if index % 2 == 0 {
                Ok(base)
            } else {
                base.checked_add_signed(Duration::days(15)).ok_or_else(|| {
                    MortgageError::DateOutOfRange(format!(
                        "{base} + 15 days overflows the calendar"
                    ))
                })
            }
        }
        None => add_months(anchor, index),
    }
}

/// First lattice point on or after `as_of`, as `(index, date)`.
///
/// The lattice stays anchored at `anchor`; `as_of` never resets it. An absent
/// `as_of`, or one before the anchor, yields the anchor unchanged.
pub fn first_payment_on_or_after(
    anchor: NaiveDate,
    frequency: PaymentFrequency,
    as_of: Option<NaiveDate>,
) -> MortgageResult<(u32, NaiveDate)> {
    let as_of = match as_of {
        Some(d) if d > anchor => d,
        _ => return Ok((0, anchor)),
    };

    for index in 0..MAX_LATTICE_STEPS {
        let date = due_date(anchor, frequency, index)?;
        if date >= as_of {
            return Ok((index, date));
        }
    }

    Err(MortgageError::DateOutOfRange(format!(
        "No payment date within {MAX_LATTICE_STEPS} periods of {anchor} reaches {as_of}"
    )))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_plain() {
        assert_eq!(add_months(ymd(2024, 1, 15), 1).unwrap(), ymd(2024, 2, 15));
        assert_eq!(add_months(ymd(2024, 11, 1), 3).unwrap(), ymd(2025, 2, 1));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        // Jan 31 + 1 month lands on leap-day February
        assert_eq!(add_months(ymd(2024, 1, 31), 1).unwrap(), ymd(2024, 2, 29));
        assert_eq!(add_months(ymd(2023, 1, 31), 1).unwrap(), ymd(2023, 2, 28));
        // Clamping never sticks: computed from the anchor, March is back on the 31st
        assert_eq!(add_months(ymd(2024, 1, 31), 2).unwrap(), ymd(2024, 3, 31));
    }

    #[test]
    fn test_monthly_lattice() {
        let anchor = ymd(2024, 1, 1);
        assert_eq!(
            due_date(anchor, PaymentFrequency::Monthly, 0).unwrap(),
            anchor
        );
        assert_eq!(
            due_date(anchor, PaymentFrequency::Monthly, 13).unwrap(),
            ymd(2025, 2, 1)
        );
    }

    #[test]
    fn test_biweekly_lattice_preserves_weekday() {
        // 2024-01-01 is a Monday; every biweekly due date must be a Monday
        let anchor = ymd(2024, 1, 1);
        for index in 0..60 {
            let date = due_date(anchor, PaymentFrequency::Biweekly, index).unwrap();
            assert_eq!(date.weekday(), chrono::Weekday::Mon, "index {index}");
        }
        // 26 payments later is exactly 364 days out
        assert_eq!(
            due_date(anchor, PaymentFrequency::Biweekly, 26).unwrap(),
            ymd(2024, 12, 30)
        );
    }

    #[test]
    fn test_semi_monthly_lattice() {
        let anchor = ymd(2024, 1, 1);
        assert_eq!(
            due_date(anchor, PaymentFrequency::SemiMonthly, 1).unwrap(),
            ymd(2024, 1, 16)
        );
        assert_eq!(
            due_date(anchor, PaymentFrequency::SemiMonthly, 2).unwrap(),
            ymd(2024, 2, 1)
        );
        assert_eq!(
            due_date(anchor, PaymentFrequency::SemiMonthly, 3).unwrap(),
            ymd(2024, 2, 16)
        );
    }

    #[test]
    fn test_semi_monthly_dates_strictly_increase() {
        let anchor = ymd(2024, 1, 25);
        let mut prev = due_date(anchor, PaymentFrequency::SemiMonthly, 0).unwrap();
        for index in 1..48 {
            let next = due_date(anchor, PaymentFrequency::SemiMonthly, index).unwrap();
            assert!(next > prev, "index {index}: {next} !> {prev}");
            prev = next;
        }
    }

    #[test]
    fn test_first_payment_without_as_of_is_anchor() {
        let anchor = ymd(2024, 1, 1);
        let (index, date) =
            first_payment_on_or_after(anchor, PaymentFrequency::Monthly, None).unwrap();
        assert_eq!((index, date), (0, anchor));
    }

    #[test]
    fn test_first_payment_as_of_before_anchor_is_anchor() {
        let anchor = ymd(2024, 1, 1);
        let (index, date) =
            first_payment_on_or_after(anchor, PaymentFrequency::Monthly, Some(ymd(2020, 6, 1)))
                .unwrap();
        assert_eq!((index, date), (0, anchor));
    }

    #[test]
    fn test_first_payment_stays_on_monthly_lattice() {
        // Due dates fall on the 1st; mid-March rolls forward to April 1st
        let anchor = ymd(2024, 1, 1);
        let (index, date) =
            first_payment_on_or_after(anchor, PaymentFrequency::Monthly, Some(ymd(2026, 3, 15)))
                .unwrap();
        assert_eq!(date, ymd(2026, 4, 1));
        assert_eq!(index, 27);
    }

    #[test]
    fn test_first_payment_exact_hit_on_lattice() {
        let anchor = ymd(2024, 1, 1);
        let (index, date) =
            first_payment_on_or_after(anchor, PaymentFrequency::Monthly, Some(ymd(2026, 3, 1)))
                .unwrap();
        assert_eq!(date, ymd(2026, 3, 1));
        assert_eq!(index, 26);
    }

    #[test]
    fn test_first_payment_biweekly_keeps_cadence_day() {
        let anchor = ymd(2024, 1, 1); // Monday
        let (_, date) =
            first_payment_on_or_after(anchor, PaymentFrequency::Biweekly, Some(ymd(2024, 3, 20)))
                .unwrap();
        assert_eq!(date, ymd(2024, 3, 25));
        assert_eq!(date.weekday(), chrono::Weekday::Mon);
    }
}
