use crate::application::rate_resolver::{RateResolution, RateResolver};
use crate::domain::currency::{CurrencyBook, CurrencyDescriptor};
use crate::domain::payment_method::PaymentMethodId;
use crate::domain::ports::PosConfigStoreBox;
use crate::domain::pos_config::{PosConfig, PosConfigId};
use crate::error::{PosError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Rate information for one payment method, as shown to the order-entry UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodRate {
    pub method_id: PaymentMethodId,
    pub method_name: String,
    pub currency: Option<CurrencyDescriptor>,
    pub base_currency: Option<CurrencyDescriptor>,
    pub rate: Decimal,
    pub resolution: RateResolution,
}

/// Saves POS configurations and answers rate queries against them.
pub struct ConfigService {
    configs: PosConfigStoreBox,
    currencies: CurrencyBook,
    resolver: RateResolver,
}

impl ConfigService {
    pub fn new(configs: PosConfigStoreBox, currencies: CurrencyBook, resolver: RateResolver) -> Self {
        Self {
            configs,
            currencies,
            resolver,
        }
    }

    pub fn currencies(&self) -> &CurrencyBook {
        &self.currencies
    }

    /// Validates and persists a configuration; invalid ones are never stored.
    pub async fn save(&self, config: PosConfig) -> Result<()> {
        config.validate(&self.currencies)?;
        info!(config = config.id, multi_currency = config.multi_currency_payments, "Saved POS configuration");
        self.configs.store(config).await
    }

    pub async fn get(&self, id: PosConfigId) -> Result<PosConfig> {
        self.configs.get(id).await?.ok_or(PosError::ConfigNotFound(id))
    }

    /// Toggles multi-currency payments, cascading resets to payment methods on disable.
    pub async fn set_multi_currency(&self, id: PosConfigId, enabled: bool) -> Result<PosConfig> {
        let mut config = self.get(id).await?;
        config.set_multi_currency(enabled);
        self.save(config.clone()).await?;
        Ok(config)
    }

    /// Read-only query returning the effective rate of every payment method.
    pub async fn payment_method_rates(
        &self,
        id: PosConfigId,
        as_of: NaiveDate,
    ) -> Result<Vec<MethodRate>> {
        let config = self.get(id).await?;
        if !config.multi_currency_payments {
            return Err(PosError::MultiCurrencyDisabled(config.name));
        }
        let base = config
            .base_currency_id
            .ok_or_else(|| PosError::MissingBaseCurrency(config.name.clone()))?;
        let base_currency = self.currencies.get(base).map(CurrencyDescriptor::from);

        let mut rates = Vec::with_capacity(config.payment_methods.len());
        for method in &config.payment_methods {
            let resolution = self
                .resolver
                .resolve(method, base, config.company_id, as_of)
                .await;
            rates.push(MethodRate {
                method_id: method.id,
                method_name: method.name.clone(),
                currency: method
                    .payment_currency_id
                    .and_then(|c| self.currencies.get(c))
                    .map(CurrencyDescriptor::from),
                base_currency: base_currency.clone(),
                rate: resolution.rate(),
                resolution,
            });
        }
        Ok(rates)
    }
}
