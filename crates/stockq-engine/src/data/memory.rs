//! In-memory implementation of [`MarketData`]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::MarketData;
use crate::error::Result;
use crate::model::PriceBar;

/// Bars held in memory, indexed by symbol and date
///
/// The catalog is reported in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    series: HashMap<String, BTreeMap<NaiveDate, PriceBar>>,
    symbols: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from bars
    pub fn from_bars(bars: impl IntoIterator<Item = PriceBar>) -> Self {
        let mut store = Self::new();
        store.extend(bars);
        store
    }

    /// Insert a bar, replacing any existing bar for the same symbol and date
    pub fn insert(&mut self, bar: PriceBar) {
        if !self.series.contains_key(&bar.symbol) {
            self.symbols.push(bar.symbol.clone());
        }
        self.series
            .entry(bar.symbol.clone())
            .or_default()
            .insert(bar.date, bar);
    }

    pub fn extend(&mut self, bars: impl IntoIterator<Item = PriceBar>) {
        for bar in bars {
            self.insert(bar);
        }
    }

    /// Number of stored bars
    pub fn len(&self) -> usize {
        self.series.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bar_on(&self, symbol: &str, date: NaiveDate) -> Option<&PriceBar> {
        self.series.get(symbol).and_then(|bars| bars.get(&date))
    }
}

#[async_trait]
impl MarketData for MemoryStore {
    async fn load_series(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .series
            .get(symbol)
            .map(|bars| bars.range(start..=end).map(|(_, bar)| bar.clone()).collect())
            .unwrap_or_default())
    }

    async fn load_day(&self, date: NaiveDate) -> Result<Vec<PriceBar>> {
        Ok(self
            .symbols
            .iter()
            .filter_map(|symbol| self.bar_on(symbol, date).cloned())
            .collect())
    }

    async fn list_available_dates(&self) -> Result<Vec<NaiveDate>> {
        let dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|bars| bars.keys().copied())
            .collect();
        Ok(dates.into_iter().collect())
    }

    async fn list_catalog_symbols(&self, date: Option<NaiveDate>) -> Result<Vec<String>> {
        Ok(match date {
            Some(date) => self
                .symbols
                .iter()
                .filter(|symbol| self.bar_on(symbol, date).is_some())
                .cloned()
                .collect(),
            None => self.symbols.clone(),
        })
    }
}
