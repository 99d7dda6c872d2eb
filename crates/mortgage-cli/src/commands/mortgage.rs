use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use mortgage_core::annuity;
use mortgage_core::schedule;
use mortgage_core::types::{with_metadata, LoanTerms};

use crate::input;

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON file with the loan terms
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the periodic payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Outstanding balance to amortize
    #[arg(long)]
    pub balance: Decimal,

    /// Periodic interest rate as a decimal (e.g. 0.00458333 for 5.5%/12)
    #[arg(long)]
    pub periodic_rate: Decimal,

    /// Number of periods to full amortization
    #[arg(long)]
    pub periods: u32,
}

/// Arguments for the balance query
#[derive(Args)]
pub struct BalanceArgs {
    /// Path to JSON file with the loan terms
    #[arg(long)]
    pub input: Option<String>,

    /// Date to value the balance at (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: NaiveDate,
}

/// Arguments for the remaining-term estimate
#[derive(Args)]
pub struct RemainingTermArgs {
    /// Outstanding balance
    #[arg(long)]
    pub balance: Decimal,

    /// Periodic interest rate as a decimal
    #[arg(long)]
    pub periodic_rate: Decimal,

    /// Fixed periodic payment
    #[arg(long)]
    pub payment: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentInput {
    balance: Decimal,
    periodic_rate: Decimal,
    periods: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentOutput {
    payment_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemainingTermInput {
    balance: Decimal,
    periodic_rate: Decimal,
    payment: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemainingTermOutput {
    remaining_periods: u32,
    is_estimate: bool,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = read_terms(args.input.as_deref())?;
    let result = schedule::build_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let assumptions = PaymentInput {
        balance: args.balance,
        periodic_rate: args.periodic_rate,
        periods: args.periods,
    };
    let payment_amount = annuity::periodic_payment(args.balance, args.periodic_rate, args.periods)?
        .round_dp(2);
    let elapsed = start.elapsed().as_micros() as u64;

    let result = with_metadata(
        "Fixed Periodic Payment (annuity formula)",
        &assumptions,
        Vec::new(),
        elapsed,
        PaymentOutput { payment_amount },
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_balance(args: BalanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = read_terms(args.input.as_deref())?;
    let result = schedule::balance_as_of(&terms, args.as_of)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_remaining_term(args: RemainingTermArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let assumptions = RemainingTermInput {
        balance: args.balance,
        periodic_rate: args.periodic_rate,
        payment: args.payment,
    };
    let remaining_periods =
        annuity::remaining_periods(args.balance, args.periodic_rate, args.payment)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let result = with_metadata(
        "Remaining Term Estimate (closed-form annuity solution)",
        &assumptions,
        vec![
            "Remaining term solved from the balance and payment, not from payment history".into(),
        ],
        elapsed,
        RemainingTermOutput {
            remaining_periods,
            is_estimate: true,
        },
    );
    Ok(serde_json::to_value(result)?)
}

fn read_terms(path: Option<&str>) -> Result<LoanTerms, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_json(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("--input <file.json> or stdin required for loan terms".into())
}
