//! Data-access contract consumed by the engine
//!
//! The engine never writes; every implementation is treated as a read-only
//! snapshot for the duration of one query.

pub mod csv;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::model::PriceBar;

pub use self::csv::CsvStore;
pub use memory::MemoryStore;

/// Read access to stored daily bars
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Bars for one symbol in `[start, end]`, ascending by date (empty if none)
    async fn load_series(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<PriceBar>>;

    /// Bars for every symbol on `date` (empty if none)
    async fn load_day(&self, date: NaiveDate) -> Result<Vec<PriceBar>>;

    /// Distinct dates that have data, ascending
    async fn list_available_dates(&self) -> Result<Vec<NaiveDate>>;

    /// Known symbols, optionally restricted to those with a bar on `date`
    async fn list_catalog_symbols(&self, date: Option<NaiveDate>) -> Result<Vec<String>>;
}
