use crate::domain::currency::CurrencyId;
use crate::domain::payment_method::PaymentMethodId;
use crate::error::{PosError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type PaymentId = u64;
pub type OrderId = u64;

/// An order as it exists once the host has committed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedOrder {
    pub id: OrderId,
    /// Identifier generated by the client before the order existed.
    pub client_uuid: Option<String>,
    /// Externally visible receipt reference.
    pub pos_reference: Option<String>,
}

impl CommittedOrder {
    /// Every key the client may have staged data under, highest priority first.
    pub fn candidate_keys(&self) -> Vec<String> {
        let mut keys = vec![self.id.to_string()];
        for key in [&self.client_uuid, &self.pos_reference].into_iter().flatten() {
            let key = key.trim();
            if !key.is_empty() && !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        keys
    }
}

/// Multi-currency fields written onto a payment row at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAnnotation {
    pub payment_currency_id: CurrencyId,
    pub amount_in_currency: Decimal,
    pub exchange_rate_used: Decimal,
}

/// A persisted payment row, extended with the original-currency tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payment_method_id: PaymentMethodId,
    /// Amount in the configuration's base currency.
    pub amount: Decimal,
    #[serde(default)]
    pub tender_line_id: Option<String>,
    #[serde(default)]
    pub payment_currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub amount_in_currency: Option<Decimal>,
    pub exchange_rate_used: Decimal,
}

impl PaymentRecord {
    pub fn new(
        id: PaymentId,
        order_id: OrderId,
        payment_method_id: PaymentMethodId,
        amount: Decimal,
    ) -> Self {
        Self {
            id,
            order_id,
            payment_method_id,
            amount,
            tender_line_id: None,
            payment_currency_id: None,
            amount_in_currency: None,
            exchange_rate_used: Decimal::ONE,
        }
    }

    pub fn is_annotated(&self) -> bool {
        self.payment_currency_id.is_some()
    }

    /// Writes the multi-currency fields. A row is annotated at most once.
    pub fn annotate(&mut self, annotation: &PaymentAnnotation) -> Result<()> {
        if self.is_annotated() {
            return Err(PosError::PaymentAlreadyAnnotated(self.id));
        }
        self.payment_currency_id = Some(annotation.payment_currency_id);
        self.amount_in_currency = Some(annotation.amount_in_currency);
        self.exchange_rate_used = annotation.exchange_rate_used;
        Ok(())
    }
}
