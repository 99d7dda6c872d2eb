use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::annuity;
use crate::calendar;
use crate::error::MortgageError;
use crate::types::{
    with_metadata, ComputationOutput, LoanTerms, Money, PaymentFrequency, Rate, ScheduleEntry,
};
use crate::MortgageResult;

// 200 years of weekly payments; terms beyond this are data-entry errors.
const MAX_SCHEDULE_PERIODS: u32 = 10_400;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Complete amortization schedule output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    /// Contractual periodic payment (cent-rounded)
    pub payment_amount: Money,
    /// Periodic rate used for interest accrual
    pub periodic_rate: Rate,
    /// Number of scheduled payments actually produced
    pub periods: u32,
    /// Due date of the first produced entry
    pub first_due_date: NaiveDate,
    /// Sum of all interest portions
    pub total_interest: Money,
    /// Sum of all principal portions (equals the starting balance)
    pub total_principal: Money,
    /// True when the period count was solved from a reported balance rather
    /// than taken from the contractual term
    pub remaining_term_is_estimate: bool,
    pub entries: Vec<ScheduleEntry>,
}

/// Where a balance figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    /// Caller-reported balance, returned untouched
    Reported,
    /// Walked off the original amortization schedule
    Derived,
}

/// Outstanding balance at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceOutput {
    pub balance: Money,
    pub as_of: NaiveDate,
    pub source: BalanceSource,
    /// Scheduled payments due on or before `as_of` (derived mode only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments_made: Option<u32>,
    /// First scheduled due date strictly after `as_of`, if the loan is still
    /// outstanding then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the full fixed-payment amortization schedule for `terms`.
///
/// With no `current_balance` the schedule runs the contractual
/// `amortization_periods` from `start_date`. With a `current_balance` the
/// contractual payment is kept (derived from the original amount and full
/// term), the remaining period count is solved from the balance, and due
/// dates continue on the lattice anchored at `start_date`; `as_of_date`
/// never resets the cadence.
///
/// The engine is pure: identical terms always produce an identical schedule.
pub fn build_schedule(terms: &LoanTerms) -> MortgageResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (iter, remaining_term_is_estimate) = prepare(terms, &mut warnings)?;
    let payment_amount = iter.payment;
    let periodic_rate = iter.periodic_rate;

    let entries = iter.collect::<MortgageResult<Vec<ScheduleEntry>>>()?;

    let total_interest = entries
        .iter()
        .map(|e| e.interest_portion)
        .fold(Decimal::ZERO, |acc, x| acc + x);
    let total_principal = entries
        .iter()
        .map(|e| e.principal_portion)
        .fold(Decimal::ZERO, |acc, x| acc + x);

    let first_due_date = match entries.first() {
        Some(entry) => entry.due_date,
        None => terms.start_date,
    };

    let output = AmortizationOutput {
        payment_amount,
        periodic_rate,
        periods: entries.len() as u32,
        first_due_date,
        total_interest,
        total_principal,
        remaining_term_is_estimate,
        entries,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Fixed-Payment Amortization Schedule (nominal periodic rate)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

/// Lazy variant of [`build_schedule`]: validates the terms and returns the
/// schedule as a restartable iterator without materializing it.
pub fn schedule_iter(terms: &LoanTerms) -> MortgageResult<ScheduleIter> {
    let mut warnings = Vec::new();
    let (iter, _) = prepare(terms, &mut warnings)?;
    Ok(iter)
}

/// Outstanding balance as of `as_of`.
///
/// A reported `current_balance` is authoritative and returned untouched.
/// Otherwise the balance is read off the original schedule: the latest entry
/// due on or before `as_of`, or the original amount when no payment has yet
/// fallen due.
pub fn balance_as_of(
    terms: &LoanTerms,
    as_of: NaiveDate,
) -> MortgageResult<ComputationOutput<BalanceOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_terms(terms, &mut warnings)?;

    let output = if let Some(balance) = terms.current_balance {
        let day_after = as_of.succ_opt().ok_or_else(|| {
            MortgageError::DateOutOfRange(format!("{as_of} is at the end of the calendar"))
        })?;
        let (_, next_due) = calendar::first_payment_on_or_after(
            terms.start_date,
            terms.payment_frequency,
            Some(day_after),
        )?;
        BalanceOutput {
            balance,
            as_of,
            source: BalanceSource::Reported,
            payments_made: None,
            next_due_date: Some(next_due),
        }
    } else {
        let mut balance = round_cents(terms.original_amount);
        let mut payments_made = 0;
        let mut next_due_date = None;

        for entry in schedule_iter(terms)? {
            let entry = entry?;
            if entry.due_date > as_of {
                next_due_date = Some(entry.due_date);
                break;
            }
            balance = entry.remaining_balance;
            payments_made = entry.payment_number;
        }

        BalanceOutput {
            balance,
            as_of,
            source: BalanceSource::Derived,
            payments_made: Some(payments_made),
            next_due_date,
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Outstanding Balance (amortization schedule scan)",
        terms,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_terms(terms: &LoanTerms, warnings: &mut Vec<String>) -> MortgageResult<()> {
    if terms.original_amount <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "original_amount".into(),
            reason: "Original amount must be positive".into(),
        });
    }

    if terms.annual_interest_rate < Decimal::ZERO || terms.annual_interest_rate >= Decimal::ONE {
        return Err(MortgageError::InvalidInput {
            field: "annual_interest_rate".into(),
            reason: "Annual rate must be a decimal in [0, 1), e.g. 0.055 for 5.5%".into(),
        });
    }

    if terms.amortization_periods == 0 {
        return Err(MortgageError::InvalidInput {
            field: "amortization_periods".into(),
            reason: "Amortization term must be at least one period".into(),
        });
    }

    if terms.amortization_periods > MAX_SCHEDULE_PERIODS {
        return Err(MortgageError::InvalidInput {
            field: "amortization_periods".into(),
            reason: format!("Amortization term exceeds {MAX_SCHEDULE_PERIODS} periods"),
        });
    }

    if let Some(balance) = terms.current_balance {
        if balance <= Decimal::ZERO {
            return Err(MortgageError::InvalidInput {
                field: "current_balance".into(),
                reason: "Current balance must be positive".into(),
            });
        }
        if balance > terms.original_amount {
            return Err(MortgageError::InvalidInput {
                field: "current_balance".into(),
                reason: "Current balance cannot exceed the original amount".into(),
            });
        }
    }

    if terms.annual_interest_rate > dec!(0.25) {
        warnings.push(format!(
            "Annual rate {} exceeds 25% — unusually high for a mortgage, verify the input",
            terms.annual_interest_rate
        ));
    }

    if terms.as_of_date.is_some() && terms.current_balance.is_none() {
        warnings.push(
            "as_of_date supplied without a current balance — schedule starts at start_date".into(),
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Schedule generation
// ---------------------------------------------------------------------------

/// Restartable per-period schedule iterator. Pure: cloning and re-running
/// yields the identical sequence.
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    anchor: NaiveDate,
    frequency: PaymentFrequency,
    /// Lattice index of the next entry's due date
    lattice_offset: u32,
    periodic_rate: Rate,
    payment: Money,
    balance: Money,
    max_periods: u32,
    emitted: u32,
}

impl Iterator for ScheduleIter {
    type Item = MortgageResult<ScheduleEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.max_periods || self.balance <= Decimal::ZERO {
            return None;
        }

        let due_date = match calendar::due_date(
            self.anchor,
            self.frequency,
            self.lattice_offset + self.emitted,
        ) {
            Ok(date) => date,
            Err(e) => {
                self.emitted = self.max_periods;
                return Some(Err(e));
            }
        };

        let payment_number = self.emitted + 1;
        let interest_portion = round_cents(self.balance * self.periodic_rate);
        let scheduled_principal = self.payment - interest_portion;

        // The last entry retires the balance exactly, absorbing any rounding
        // residue left by the fixed payment.
        let is_final = payment_number == self.max_periods || scheduled_principal >= self.balance;

        let (payment_amount, principal_portion) = if is_final {
            (interest_portion + self.balance, self.balance)
        } else {
            (self.payment, scheduled_principal)
        };

        self.balance -= principal_portion;
        self.emitted += 1;

        Some(Ok(ScheduleEntry {
            payment_number,
            due_date,
            payment_amount,
            interest_portion,
            principal_portion,
            remaining_balance: self.balance,
        }))
    }
}

/// Validate terms and assemble the schedule iterator plus the
/// estimated-term flag, pushing data-quality warnings as it goes.
fn prepare(
    terms: &LoanTerms,
    warnings: &mut Vec<String>,
) -> MortgageResult<(ScheduleIter, bool)> {
    validate_terms(terms, warnings)?;

    let periodic_rate = terms.periodic_rate();
    let payment = round_cents(contractual_payment(terms)?);

    let (balance, max_periods, lattice_offset, is_estimate) = match terms.current_balance {
        Some(balance) => {
            let remaining = annuity::remaining_periods(balance, periodic_rate, payment)?;
            let (offset, _) = calendar::first_payment_on_or_after(
                terms.start_date,
                terms.payment_frequency,
                terms.as_of_date,
            )?;
            warnings.push(
                "Remaining term estimated from the reported balance and contractual payment, \
                 not from payment history"
                    .into(),
            );
            (balance, remaining, offset, true)
        }
        None => (terms.original_amount, terms.amortization_periods, 0, false),
    };

    let iter = ScheduleIter {
        anchor: terms.start_date,
        frequency: terms.payment_frequency,
        lattice_offset,
        periodic_rate,
        payment,
        balance: round_cents(balance),
        max_periods,
        emitted: 0,
    };

    Ok((iter, is_estimate))
}

/// Contractual periodic payment for the original loan.
///
/// Standard cadences amortize the original amount at the periodic rate over
/// the full term. Accelerated cadences pay half (biweekly) or a quarter
/// (weekly) of the equivalent monthly payment, which is what retires the
/// loan ahead of its nominal term.
fn contractual_payment(terms: &LoanTerms) -> MortgageResult<Money> {
    match terms.payment_frequency.accelerated_divisor() {
        Some(divisor) => {
            let months = equivalent_months(
                terms.amortization_periods,
                terms.payment_frequency.periods_per_year(),
            );
            let monthly = annuity::periodic_payment(
                terms.original_amount,
                terms.annual_interest_rate / dec!(12),
                months,
            )?;
            Ok(monthly / Decimal::from(divisor))
        }
        None => annuity::periodic_payment(
            terms.original_amount,
            terms.periodic_rate(),
            terms.amortization_periods,
        ),
    }
}

/// Monthly-term equivalent of `periods` at `periods_per_year`, rounded to
/// the nearest whole month.
fn equivalent_months(periods: u32, periods_per_year: u32) -> u32 {
    let months = (periods as u64 * 12 + periods_per_year as u64 / 2) / periods_per_year as u64;
    months.max(1) as u32
}

fn round_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
