use crate::domain::currency::CurrencyId;
use crate::error::{PosError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type PaymentMethodId = u32;

/// Where a payment method gets its exchange rate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Looked up in the host's conversion tables.
    #[default]
    #[serde(alias = "auto")]
    Automatic,
    /// Operator-entered constant.
    Manual,
}

/// Currency and exchange-rate policy attached to a payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodConfig {
    pub id: PaymentMethodId,
    pub name: String,
    /// `None` means the method tenders in the configuration's base currency.
    #[serde(default)]
    pub payment_currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub exchange_rate_source: RateSource,
    /// 1 payment currency = `manual_exchange_rate` base currency.
    #[serde(default = "default_manual_rate")]
    pub manual_exchange_rate: Decimal,
}

fn default_manual_rate() -> Decimal {
    Decimal::ONE
}

impl PaymentMethodConfig {
    pub fn new(id: PaymentMethodId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            payment_currency_id: None,
            exchange_rate_source: RateSource::Automatic,
            manual_exchange_rate: Decimal::ONE,
        }
    }

    pub fn with_currency(mut self, currency: CurrencyId) -> Self {
        self.payment_currency_id = Some(currency);
        self
    }

    pub fn with_manual_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate_source = RateSource::Manual;
        self.manual_exchange_rate = rate;
        self
    }

    /// Checks the method's own invariants.
    pub fn validate(&self) -> Result<()> {
        if self.exchange_rate_source == RateSource::Manual
            && self.manual_exchange_rate <= Decimal::ZERO
        {
            return Err(PosError::NonPositiveManualRate {
                method: self.name.clone(),
                rate: self.manual_exchange_rate,
            });
        }
        Ok(())
    }

    /// Drops the currency policy back to base-currency defaults.
    pub fn reset_currency(&mut self) {
        self.payment_currency_id = None;
        self.exchange_rate_source = RateSource::Automatic;
        self.manual_exchange_rate = Decimal::ONE;
    }
}
