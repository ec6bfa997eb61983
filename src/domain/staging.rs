use crate::domain::currency::CurrencyId;
use crate::domain::payment::PaymentAnnotation;
use crate::domain::payment_method::PaymentMethodId;
use crate::error::{PosError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inbound staging call, as delivered by the order-entry client.
///
/// Every field is optional on the wire so that a missing one can be reported by
/// name instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StagePaymentRequest {
    #[serde(alias = "order_uuid")]
    pub client_order_key: Option<String>,
    pub payment_method_id: Option<PaymentMethodId>,
    pub payment_currency_id: Option<CurrencyId>,
    #[serde(alias = "payment_currency_amount")]
    pub amount_in_currency: Option<Decimal>,
    #[serde(alias = "payment_exchange_rate")]
    pub exchange_rate: Option<Decimal>,
    /// Amount the client converted the tender to, in base currency.
    #[serde(default)]
    pub base_amount: Option<Decimal>,
    #[serde(default)]
    pub tender_line_id: Option<String>,
}

impl StagePaymentRequest {
    /// Validates the request and stamps it into a staged entry.
    pub fn into_entry(self, created_at: DateTime<Utc>) -> Result<StagedPaymentEntry> {
        let client_order_key = self
            .client_order_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(PosError::MissingField("client_order_key"))?;
        let payment_method_id = self
            .payment_method_id
            .ok_or(PosError::MissingField("payment_method_id"))?;
        let payment_currency_id = self
            .payment_currency_id
            .ok_or(PosError::MissingField("payment_currency_id"))?;
        let amount_in_currency = self
            .amount_in_currency
            .ok_or(PosError::MissingField("amount_in_currency"))?;
        let exchange_rate = self
            .exchange_rate
            .ok_or(PosError::MissingField("exchange_rate"))?;

        if amount_in_currency <= Decimal::ZERO {
            return Err(PosError::ValidationError(format!(
                "Amount in currency must be positive, got {amount_in_currency}"
            )));
        }
        if exchange_rate <= Decimal::ZERO {
            return Err(PosError::ValidationError(format!(
                "Exchange rate must be positive, got {exchange_rate}"
            )));
        }

        Ok(StagedPaymentEntry {
            client_order_key,
            payment_method_id,
            payment_currency_id,
            amount_in_currency,
            exchange_rate,
            base_amount: self.base_amount,
            tender_line_id: self
                .tender_line_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            created_at,
        })
    }
}

/// Currency metadata for one tender line, held until its order is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedPaymentEntry {
    pub client_order_key: String,
    pub payment_method_id: PaymentMethodId,
    pub payment_currency_id: CurrencyId,
    pub amount_in_currency: Decimal,
    pub exchange_rate: Decimal,
    pub base_amount: Option<Decimal>,
    pub tender_line_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StagedPaymentEntry {
    /// The tender's value in base currency, as the client computed it.
    ///
    /// `None` when no base amount was sent and the product does not fit a `Decimal`.
    pub fn expected_base_amount(&self) -> Option<Decimal> {
        self.base_amount
            .or_else(|| self.amount_in_currency.checked_mul(self.exchange_rate))
    }

    pub fn annotation(&self) -> PaymentAnnotation {
        PaymentAnnotation {
            payment_currency_id: self.payment_currency_id,
            amount_in_currency: self.amount_in_currency,
            exchange_rate_used: self.exchange_rate,
        }
    }
}

/// A payment line as exported by the client inside the order payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WirePaymentLine {
    pub payment_method_id: Option<PaymentMethodId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub is_multicurrency: bool,
    #[serde(default)]
    pub payment_currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub payment_currency_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_exchange_rate: Option<Decimal>,
}

impl WirePaymentLine {
    /// Converts a multi-currency line into a staging request; plain lines yield `None`.
    pub fn staging_request(&self, order_key: &str) -> Option<StagePaymentRequest> {
        if !self.is_multicurrency {
            return None;
        }
        Some(StagePaymentRequest {
            client_order_key: Some(order_key.to_string()),
            payment_method_id: self.payment_method_id,
            payment_currency_id: self.payment_currency_id,
            amount_in_currency: self.payment_currency_amount,
            exchange_rate: self.payment_exchange_rate,
            base_amount: self.amount,
            tender_line_id: self.uuid.clone(),
        })
    }
}
