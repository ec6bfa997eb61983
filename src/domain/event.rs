use crate::domain::currency::CurrencyId;
use crate::domain::payment_method::PaymentMethodId;
use crate::domain::staging::StagePaymentRequest;
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Client stages multi-currency data for a tender line.
    Stage,
    /// Client adds a tender line (base-currency amount) to its draft order.
    Pay,
    /// Host commits the draft order and its payment rows.
    Commit,
}

/// One step of a POS session, as replayed from an events file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PosEvent {
    pub r#type: EventType,
    /// Client order key.
    pub order: String,
    #[serde(default)]
    pub method: Option<PaymentMethodId>,
    #[serde(default)]
    pub currency: Option<CurrencyId>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Tender line id.
    #[serde(default)]
    pub line: Option<String>,
    /// POS receipt reference, on commit.
    #[serde(default)]
    pub reference: Option<String>,
}

impl PosEvent {
    pub fn staging_request(&self) -> StagePaymentRequest {
        StagePaymentRequest {
            client_order_key: Some(self.order.clone()),
            payment_method_id: self.method,
            payment_currency_id: self.currency,
            amount_in_currency: self.amount,
            exchange_rate: self.rate,
            base_amount: None,
            tender_line_id: self.line.clone(),
        }
    }
}
