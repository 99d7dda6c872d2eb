use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.055 = 5.5%). Never as percentages.
pub type Rate = Decimal;

/// Payment cadence of a mortgage.
///
/// The accelerated variants accrue interest on the same 26/52 lattice as
/// their plain counterparts but pay half (biweekly) or a quarter (weekly) of
/// the equivalent monthly payment, so the loan retires ahead of its nominal
/// amortization period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentFrequency {
    Monthly,
    SemiMonthly,
    Biweekly,
    Weekly,
    AcceleratedBiweekly,
    AcceleratedWeekly,
}

impl PaymentFrequency {
    /// Number of scheduled payments per year.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    /// Divisor applied to the equivalent monthly payment for accelerated
    /// cadences (None for standard cadences).
    pub fn accelerated_divisor(&self) -> Option<u32> {
        match self {
            PaymentFrequency::AcceleratedBiweekly => Some(2),
            PaymentFrequency::AcceleratedWeekly => Some(4),
            _ => None,
        }
    }
}

/// Contractual terms of a mortgage, as normalized by the caller.
///
/// `current_balance`/`as_of_date` resume schedule generation mid-term: the
/// contractual payment still comes from the original amount and full term,
/// and due dates stay on the lattice anchored at `start_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Original principal
    pub original_amount: Money,
    /// Outstanding principal today, when known (≤ original_amount)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Money>,
    /// Nominal annual interest rate in [0, 1)
    pub annual_interest_rate: Rate,
    /// Total periods for full amortization (years × payments per year)
    pub amortization_periods: u32,
    pub payment_frequency: PaymentFrequency,
    /// First scheduled payment date; anchors the due-date lattice
    pub start_date: NaiveDate,
    /// Date the current_balance was observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<NaiveDate>,
}

impl LoanTerms {
    /// Periodic rate under the nominal-division convention:
    /// annual rate / payments per year.
    pub fn periodic_rate(&self) -> Rate {
        self.annual_interest_rate / Decimal::from(self.payment_frequency.periods_per_year())
    }
}

/// One row of an amortization schedule. Amounts are rounded to the cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub payment_number: u32,
    pub due_date: NaiveDate,
    pub payment_amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub remaining_balance: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
