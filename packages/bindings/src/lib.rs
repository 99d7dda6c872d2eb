use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use mortgage_core::types::LoanTerms;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = mortgage_core::schedule::build_schedule(&terms).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Balance query
// ---------------------------------------------------------------------------

#[napi]
pub fn balance_as_of(input_json: String, as_of: String) -> NapiResult<String> {
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let as_of: NaiveDate = as_of.parse().map_err(to_napi_error)?;
    let output = mortgage_core::schedule::balance_as_of(&terms, as_of).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Closed-form annuity helpers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PaymentRequest {
    balance: Decimal,
    periodic_rate: Decimal,
    periods: u32,
}

#[napi]
pub fn periodic_payment(input_json: String) -> NapiResult<String> {
    let req: PaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let payment = mortgage_core::annuity::periodic_payment(req.balance, req.periodic_rate, req.periods)
        .map_err(to_napi_error)?;
    serde_json::to_string(&payment).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct RemainingTermRequest {
    balance: Decimal,
    periodic_rate: Decimal,
    payment: Decimal,
}

#[napi]
pub fn remaining_periods(input_json: String) -> NapiResult<String> {
    let req: RemainingTermRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let periods =
        mortgage_core::annuity::remaining_periods(req.balance, req.periodic_rate, req.payment)
            .map_err(to_napi_error)?;
    serde_json::to_string(&periods).map_err(to_napi_error)
}
