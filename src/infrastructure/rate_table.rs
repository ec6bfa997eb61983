use crate::domain::currency::CurrencyId;
use crate::domain::ports::RateProvider;
use crate::domain::pos_config::CompanyId;
use crate::error::{PosError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// One dated conversion rate: 1 `from` = `rate` `to`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateTableEntry {
    pub from: CurrencyId,
    pub to: CurrencyId,
    pub date: NaiveDate,
    pub rate: Decimal,
    /// Restricts the rate to one company; shared by all companies when absent.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

type PairKey = (Option<CompanyId>, CurrencyId, CurrencyId);

/// Dated conversion rates, answering with the latest rate on or before a date.
///
/// A pair missing in one direction is answered from its inverse. Company-specific
/// rates take precedence over shared ones.
#[derive(Debug, Clone, Default)]
pub struct StaticRateTable {
    rates: HashMap<PairKey, BTreeMap<NaiveDate, Decimal>>,
}

impl StaticRateTable {
    pub fn new(entries: impl IntoIterator<Item = RateTableEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    pub fn insert(&mut self, entry: RateTableEntry) {
        if entry.rate <= Decimal::ZERO {
            tracing::warn!(
                from = entry.from,
                to = entry.to,
                date = %entry.date,
                rate = %entry.rate,
                "Ignoring non-positive rate table entry"
            );
            return;
        }
        self.rates
            .entry((entry.company_id, entry.from, entry.to))
            .or_default()
            .insert(entry.date, entry.rate);
    }

    fn latest(&self, key: PairKey, date: NaiveDate) -> Option<Decimal> {
        self.rates
            .get(&key)
            .and_then(|dated| dated.range(..=date).next_back())
            .map(|(_, rate)| *rate)
    }

    fn lookup(
        &self,
        company: Option<CompanyId>,
        from: CurrencyId,
        to: CurrencyId,
        date: NaiveDate,
    ) -> Option<Decimal> {
        self.latest((company, from, to), date).or_else(|| {
            self.latest((company, to, from), date)
                .map(|inverse| Decimal::ONE / inverse)
        })
    }
}

#[async_trait]
impl RateProvider for StaticRateTable {
    async fn rate_for(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        company: CompanyId,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.lookup(Some(company), from, to, date)
            .or_else(|| self.lookup(None, from, to, date))
            .ok_or(PosError::RateUnavailable { from, to, date })
    }
}
