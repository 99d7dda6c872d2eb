use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Non-amortizing loan: payment {payment} does not exceed per-period interest \
         ({balance} × {periodic_rate}) — the balance can never be retired"
    )]
    NonAmortizingLoan {
        balance: Decimal,
        periodic_rate: Decimal,
        payment: Decimal,
    },

    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MortgageError {
    fn from(e: serde_json::Error) -> Self {
        MortgageError::SerializationError(e.to_string())
    }
}
