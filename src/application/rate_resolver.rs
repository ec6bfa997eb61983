use crate::domain::currency::CurrencyId;
use crate::domain::payment_method::{PaymentMethodConfig, RateSource};
use crate::domain::ports::RateProviderBox;
use crate::domain::pos_config::CompanyId;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// How an effective exchange rate was obtained.
///
/// `Fallback` marks the expected, recoverable case where a live lookup failed and
/// the resolver answered 1.0 instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RateResolution {
    /// The method tenders in the base currency.
    Identity,
    Manual { rate: Decimal },
    Automatic { rate: Decimal },
    Fallback { reason: String },
}

impl RateResolution {
    /// Units of base currency per unit of payment currency.
    pub fn rate(&self) -> Decimal {
        match self {
            RateResolution::Manual { rate } | RateResolution::Automatic { rate } => *rate,
            RateResolution::Identity | RateResolution::Fallback { .. } => Decimal::ONE,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RateResolution::Fallback { .. })
    }
}

/// Resolves the exchange rate a payment method should use.
pub struct RateResolver {
    provider: RateProviderBox,
}

impl RateResolver {
    pub fn new(provider: RateProviderBox) -> Self {
        Self { provider }
    }

    /// Returns the effective rate for `method` against `base` on `as_of`.
    ///
    /// Never fails: a lookup error degrades to [`RateResolution::Fallback`] so an
    /// order commit is never blocked by a missing rate. Performs at most one
    /// lookup and no retries.
    pub async fn resolve(
        &self,
        method: &PaymentMethodConfig,
        base: CurrencyId,
        company: CompanyId,
        as_of: NaiveDate,
    ) -> RateResolution {
        let currency = match method.payment_currency_id {
            Some(currency) if currency != base => currency,
            _ => return RateResolution::Identity,
        };

        match method.exchange_rate_source {
            RateSource::Manual => RateResolution::Manual {
                rate: method.manual_exchange_rate,
            },
            RateSource::Automatic => {
                match self.provider.rate_for(currency, base, company, as_of).await {
                    Ok(rate) if rate > Decimal::ZERO => {
                        debug!(method = method.id, currency, base, %rate, %as_of, "Resolved exchange rate");
                        RateResolution::Automatic { rate }
                    }
                    Ok(rate) => {
                        warn!(method = method.id, currency, base, %rate, "Rate provider returned a non-positive rate, using 1.0");
                        RateResolution::Fallback {
                            reason: format!("non-positive rate {rate}"),
                        }
                    }
                    Err(e) => {
                        warn!(method = method.id, currency, base, error = %e, "Exchange rate lookup failed, using 1.0");
                        RateResolution::Fallback {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}
