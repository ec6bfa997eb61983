use crate::domain::currency::{CurrencyBook, CurrencyId};
use crate::domain::payment_method::{PaymentMethodConfig, PaymentMethodId};
use crate::error::{PosError, Result};
use serde::{Deserialize, Serialize};

pub type PosConfigId = u32;
pub type CompanyId = u32;

/// A point-of-sale configuration and the payment methods it offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosConfig {
    pub id: PosConfigId,
    pub name: String,
    #[serde(default = "default_company")]
    pub company_id: CompanyId,
    #[serde(default)]
    pub multi_currency_payments: bool,
    /// Accounting currency that every foreign tender is valued against.
    #[serde(default)]
    pub base_currency_id: Option<CurrencyId>,
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethodConfig>,
}

fn default_company() -> CompanyId {
    1
}

impl PosConfig {
    pub fn new(id: PosConfigId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            company_id: default_company(),
            multi_currency_payments: false,
            base_currency_id: None,
            payment_methods: Vec::new(),
        }
    }

    pub fn method(&self, id: PaymentMethodId) -> Option<&PaymentMethodConfig> {
        self.payment_methods.iter().find(|m| m.id == id)
    }

    /// Save-time validation.
    ///
    /// Manual rates are always checked. Currency activity is only enforced while
    /// multi-currency payments are enabled, since the currency fields are inert
    /// otherwise.
    pub fn validate(&self, currencies: &CurrencyBook) -> Result<()> {
        for method in &self.payment_methods {
            method.validate()?;
        }

        if !self.multi_currency_payments {
            return Ok(());
        }

        match self.base_currency_id {
            Some(base) if currencies.is_active(base) => {}
            _ => return Err(PosError::MissingBaseCurrency(self.name.clone())),
        }

        for method in &self.payment_methods {
            if let Some(currency) = method.payment_currency_id
                && !currencies.is_active(currency)
            {
                return Err(PosError::InactiveCurrency {
                    method: method.name.clone(),
                    currency: currencies.display_name(currency),
                });
            }
        }

        Ok(())
    }

    /// Toggles multi-currency payments.
    ///
    /// Disabling cascades to every payment method, resetting its currency policy.
    pub fn set_multi_currency(&mut self, enabled: bool) {
        self.multi_currency_payments = enabled;
        if !enabled {
            for method in &mut self.payment_methods {
                method.reset_currency();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::Currency;
    use crate::domain::payment_method::RateSource;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn currencies() -> CurrencyBook {
        CurrencyBook::new([
            Currency {
                id: 1,
                name: "USD".to_string(),
                symbol: "$".to_string(),
                active: true,
            },
            Currency {
                id: 2,
                name: "MXN".to_string(),
                symbol: "$".to_string(),
                active: true,
            },
            Currency {
                id: 3,
                name: "VEF".to_string(),
                symbol: "Bs".to_string(),
                active: false,
            },
        ])
    }

    fn shop() -> PosConfig {
        let mut config = PosConfig::new(1, "Main Shop");
        config.multi_currency_payments = true;
        config.base_currency_id = Some(1);
        config.payment_methods = vec![
            PaymentMethodConfig::new(1, "Cash"),
            PaymentMethodConfig::new(2, "Cash MXN").with_currency(2),
        ];
        config
    }

    #[test]
    fn test_valid_configuration() {
        assert!(shop().validate(&currencies()).is_ok());
    }

    #[test]
    fn test_enabling_requires_active_base_currency() {
        let mut config = shop();
        config.base_currency_id = None;
        assert!(matches!(
            config.validate(&currencies()),
            Err(PosError::MissingBaseCurrency(name)) if name == "Main Shop"
        ));

        config.base_currency_id = Some(3);
        assert!(matches!(
            config.validate(&currencies()),
            Err(PosError::MissingBaseCurrency(_))
        ));
    }

    #[test]
    fn test_inactive_payment_currency_is_rejected() {
        let mut config = shop();
        config
            .payment_methods
            .push(PaymentMethodConfig::new(3, "Cash VEF").with_currency(3));

        let err = config.validate(&currencies()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Payment method 'Cash VEF' uses inactive currency 'VEF'"
        );
    }

    #[test]
    fn test_non_positive_manual_rate_rejected_even_when_disabled() {
        let mut config = shop();
        config.multi_currency_payments = false;
        config.payment_methods[1] = PaymentMethodConfig::new(2, "Cash MXN")
            .with_currency(2)
            .with_manual_rate(dec!(0));
        assert!(matches!(
            config.validate(&currencies()),
            Err(PosError::NonPositiveManualRate { .. })
        ));
    }

    #[test]
    fn test_disabled_configuration_skips_currency_checks() {
        let mut config = shop();
        config.multi_currency_payments = false;
        config.base_currency_id = None;
        config
            .payment_methods
            .push(PaymentMethodConfig::new(3, "Cash VEF").with_currency(3));
        assert!(config.validate(&currencies()).is_ok());
    }

    #[test]
    fn test_disabling_cascades_to_methods() {
        let mut config = shop();
        config.payment_methods[1] = PaymentMethodConfig::new(2, "Cash MXN")
            .with_currency(2)
            .with_manual_rate(dec!(0.054));

        config.set_multi_currency(false);

        assert!(!config.multi_currency_payments);
        for method in &config.payment_methods {
            assert_eq!(method.payment_currency_id, None);
            assert_eq!(method.exchange_rate_source, RateSource::Automatic);
            assert_eq!(method.manual_exchange_rate, Decimal::ONE);
        }
    }

    #[test]
    fn test_enabling_keeps_methods() {
        let mut config = shop();
        config.set_multi_currency(true);
        assert_eq!(config.method(2).unwrap().payment_currency_id, Some(2));
    }
}
