use crate::error::{PosError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type CurrencyId = u32;

/// A currency known to the host system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    /// ISO code, e.g. "USD".
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// The subset of a currency exposed to order-entry clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDescriptor {
    pub id: CurrencyId,
    pub name: String,
    pub symbol: String,
}

impl From<&Currency> for CurrencyDescriptor {
    fn from(currency: &Currency) -> Self {
        Self {
            id: currency.id,
            name: currency.name.clone(),
            symbol: currency.symbol.clone(),
        }
    }
}

/// Lookup table of every currency the host knows about, active or not.
#[derive(Debug, Clone, Default)]
pub struct CurrencyBook {
    currencies: HashMap<CurrencyId, Currency>,
}

impl CurrencyBook {
    pub fn new(currencies: impl IntoIterator<Item = Currency>) -> Self {
        Self {
            currencies: currencies.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: CurrencyId) -> Option<&Currency> {
        self.currencies.get(&id)
    }

    /// Returns the currency if it exists, failing on a dangling reference.
    pub fn require(&self, id: CurrencyId) -> Result<&Currency> {
        self.get(id).ok_or(PosError::UnknownCurrency(id))
    }

    pub fn is_active(&self, id: CurrencyId) -> bool {
        self.get(id).is_some_and(|c| c.active)
    }

    /// Human-readable name for error messages; falls back to the raw id.
    pub fn display_name(&self, id: CurrencyId) -> String {
        self.get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }
}
