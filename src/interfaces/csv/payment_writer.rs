use crate::domain::currency::CurrencyId;
use crate::domain::payment::{OrderId, PaymentId, PaymentRecord};
use crate::domain::payment_method::PaymentMethodId;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PaymentRow {
    payment: PaymentId,
    order: OrderId,
    method: PaymentMethodId,
    amount: Decimal,
    currency: Option<CurrencyId>,
    amount_in_currency: Option<Decimal>,
    exchange_rate: Decimal,
}

impl From<&PaymentRecord> for PaymentRow {
    fn from(payment: &PaymentRecord) -> Self {
        Self {
            payment: payment.id,
            order: payment.order_id,
            method: payment.payment_method_id,
            amount: payment.amount.normalize(),
            currency: payment.payment_currency_id,
            amount_in_currency: payment.amount_in_currency.map(|a| a.normalize()),
            exchange_rate: payment.exchange_rate_used.normalize(),
        }
    }
}

/// Writes payment rows as CSV, base-currency rows with empty currency columns.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payments(&mut self, payments: impl IntoIterator<Item = PaymentRecord>) -> Result<()> {
        for payment in payments {
            self.writer.serialize(PaymentRow::from(&payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
