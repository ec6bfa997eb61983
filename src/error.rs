use crate::domain::currency::CurrencyId;
use crate::domain::payment::PaymentId;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),

    #[error("POS configuration '{0}' enables multi-currency payments without an active base currency")]
    MissingBaseCurrency(String),
    #[error("Payment method '{method}' uses inactive currency '{currency}'")]
    InactiveCurrency { method: String, currency: String },
    #[error("Payment method '{method}' has a non-positive manual exchange rate ({rate})")]
    NonPositiveManualRate { method: String, rate: Decimal },
    #[error("POS configuration {0} not found")]
    ConfigNotFound(u32),
    #[error("Multi-currency payments are not enabled for POS configuration '{0}'")]
    MultiCurrencyDisabled(String),

    #[error("Staged payment is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No exchange rate from currency {from} to {to} on {date}")]
    RateUnavailable {
        from: CurrencyId,
        to: CurrencyId,
        date: chrono::NaiveDate,
    },
    #[error("Unknown currency reference {0}")]
    UnknownCurrency(CurrencyId),
    #[error("Payment {0} not found")]
    PaymentNotFound(PaymentId),
    #[error("Payment {0} already carries multi-currency data")]
    PaymentAlreadyAnnotated(PaymentId),

    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PosError>;
