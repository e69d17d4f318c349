//! Day-over-day price changes and text summaries

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

use super::sorted_by_date;
use super::stats::mean;
use crate::data::MarketData;
use crate::error::Result;
use crate::model::{DateRange, PriceBar};
use crate::table::{Cell, TableRow, names};

/// Close-to-close change of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub symbol: String,
    pub close: f64,
    /// Previous close, or the open for intraday changes
    pub previous: f64,
    pub change: f64,
    pub change_pct: f64,
}

impl PriceChange {
    fn new(symbol: &str, close: f64, previous: f64) -> Self {
        let change = close - previous;
        Self {
            symbol: symbol.to_string(),
            close,
            previous,
            change,
            change_pct: if previous > 0.0 { change / previous * 100.0 } else { 0.0 },
        }
    }
}

impl TableRow for PriceChange {
    fn default_columns() -> Vec<String> {
        names(&["Symbol", "Close", "Previous", "Change", "Change_Pct"])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.symbol.as_str().into(),
            self.close.into(),
            self.previous.into(),
            self.change.into(),
            self.change_pct.into(),
        ]
    }
}

/// Last bar per symbol, keyed in symbol order
fn last_by_symbol(bars: &[PriceBar]) -> BTreeMap<&str, &PriceBar> {
    bars.iter().map(|b| (b.symbol.as_str(), b)).collect()
}

/// Price changes of `day` against `previous`, or intraday (close vs open)
/// when `previous` is `None`
///
/// Symbols absent from `previous` are skipped. Sorted by change, largest
/// first.
pub fn price_changes(day: &[PriceBar], previous: Option<&[PriceBar]>) -> Vec<PriceChange> {
    let mut changes: Vec<PriceChange> = match previous {
        Some(previous) => {
            let previous: HashMap<&str, f64> = last_by_symbol(previous)
                .into_iter()
                .map(|(symbol, bar)| (symbol, bar.close))
                .collect();
            last_by_symbol(day)
                .into_iter()
                .filter_map(|(symbol, bar)| {
                    previous
                        .get(symbol)
                        .map(|prev| PriceChange::new(symbol, bar.close, *prev))
                })
                .collect()
        }
        None => last_by_symbol(day)
            .into_iter()
            .map(|(symbol, bar)| PriceChange::new(symbol, bar.close, bar.open))
            .collect(),
    };

    changes.sort_by(|a, b| {
        b.change_pct
            .total_cmp(&a.change_pct)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    changes
}

/// Price changes on `date` against the previous trading day
///
/// With fewer than two trading days on record the intraday change is used.
/// Empty when `date` has no data or is the first trading day.
pub async fn daily_price_changes(data: &dyn MarketData, date: NaiveDate) -> Result<Vec<PriceChange>> {
    let day = data.load_day(date).await?;
    if day.is_empty() {
        return Ok(Vec::new());
    }

    let dates = data.list_available_dates().await?;
    if dates.len() < 2 {
        warn!("Insufficient history for day-over-day changes, using intraday");
        return Ok(price_changes(&day, None));
    }

    let idx = dates
        .iter()
        .position(|d| *d == date)
        .unwrap_or(dates.len() - 1);
    if idx == 0 {
        warn!("No trading day before {}", date);
        return Ok(Vec::new());
    }

    let previous = data.load_day(dates[idx - 1]).await?;
    Ok(price_changes(&day, Some(&previous)))
}

/// Breadth summary of one trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub date: NaiveDate,
    pub total: usize,
    pub gainers: usize,
    pub losers: usize,
    pub average_change: f64,
    pub top_gainer: PriceChange,
    pub top_loser: PriceChange,
}

impl MarketSummary {
    /// Summarize `changes`; `None` when there are none
    pub fn from_changes(date: NaiveDate, changes: &[PriceChange]) -> Option<Self> {
        let pcts: Vec<f64> = changes.iter().map(|c| c.change_pct).collect();
        let average_change = mean(&pcts)?;
        let top_gainer = changes
            .iter()
            .max_by(|a, b| a.change_pct.total_cmp(&b.change_pct))?
            .clone();
        let top_loser = changes
            .iter()
            .min_by(|a, b| a.change_pct.total_cmp(&b.change_pct))?
            .clone();

        Some(Self {
            date,
            total: changes.len(),
            gainers: pcts.iter().filter(|p| **p > 0.0).count(),
            losers: pcts.iter().filter(|p| **p < 0.0).count(),
            average_change,
            top_gainer,
            top_loser,
        })
    }

    fn share(&self, count: usize) -> f64 {
        count as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Market Summary for {}", self.date)?;
        writeln!(f)?;
        writeln!(f, "Total Stocks: {}", self.total)?;
        writeln!(f, "Gainers: {} ({:.1}%)", self.gainers, self.share(self.gainers))?;
        writeln!(f, "Losers: {} ({:.1}%)", self.losers, self.share(self.losers))?;
        writeln!(f)?;
        writeln!(f, "Average Change: {:.2}%", self.average_change)?;
        writeln!(f)?;
        writeln!(
            f,
            "Top Gainer: {} ({:.2}%)",
            self.top_gainer.symbol, self.top_gainer.change_pct
        )?;
        write!(
            f,
            "Top Loser: {} ({:.2}%)",
            self.top_loser.symbol, self.top_loser.change_pct
        )
    }
}

/// Key statistics of one symbol over a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSummary {
    pub symbol: String,
    pub range: DateRange,
    pub last_price: f64,
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub avg_volume: f64,
}

impl SymbolSummary {
    /// Summarize `bars`; `None` for an empty series
    pub fn from_series(symbol: &str, range: DateRange, bars: &[PriceBar]) -> Option<Self> {
        let bars = sorted_by_date(bars);
        let first = bars.first()?;
        let last = bars.last()?;
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        Some(Self {
            symbol: symbol.to_string(),
            range,
            last_price: last.close,
            change_pct: if first.close > 0.0 {
                (last.close / first.close - 1.0) * 100.0
            } else {
                0.0
            },
            high: bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
            low: bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
            avg_volume: mean(&volumes)?,
        })
    }

    /// Multi-line text with prices in `currency`
    pub fn render(&self, currency: &str) -> String {
        format!(
            "Symbol: {}\nPeriod: {}\n\nLast Price: {currency}{:.2}\nChange: {:.2}%\n\nHigh: {currency}{:.2}\nLow: {currency}{:.2}\nAverage Volume: {:.0}",
            self.symbol,
            self.range,
            self.last_price,
            self.change_pct,
            self.high,
            self.low,
            self.avg_volume,
        )
    }
}
