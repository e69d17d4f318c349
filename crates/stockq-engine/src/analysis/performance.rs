//! Performance ranking across the catalog

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

use super::sorted_by_date;
use super::stats::{defined, mean, pct_changes, sample_std};
use crate::data::MarketData;
use crate::error::Result;
use crate::model::{DateRange, PriceBar};
use crate::table::{Cell, TableRow, names};

/// Ranking direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankOrder {
    /// Highest first
    Best,
    /// Lowest first
    Worst,
}

/// Ranking key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankMetric {
    #[default]
    Return,
    Volatility,
    Volume,
}

impl RankMetric {
    /// Column header of the metric
    pub fn label(&self) -> &'static str {
        match self {
            Self::Return => "Return (%)",
            Self::Volatility => "Volatility (%)",
            Self::Volume => "Avg_Volume",
        }
    }
}

/// Performance of one symbol over a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub symbol: String,
    pub start_price: f64,
    pub end_price: f64,
    pub return_pct: f64,
    /// Sample stdev of day-over-day % change
    pub volatility: Option<f64>,
    pub avg_volume: f64,
}

impl PerformanceRow {
    /// Compute performance; `None` with fewer than two bars or a zero start price
    pub fn from_series(symbol: &str, bars: &[PriceBar]) -> Option<Self> {
        if bars.len() < 2 {
            return None;
        }
        let bars = sorted_by_date(bars);
        let start_price = bars.first()?.close;
        let end_price = bars.last()?.close;
        if start_price == 0.0 {
            return None;
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        Some(Self {
            symbol: symbol.to_string(),
            start_price,
            end_price,
            return_pct: (end_price / start_price - 1.0) * 100.0,
            volatility: sample_std(&defined(&pct_changes(&closes))),
            avg_volume: mean(&volumes).unwrap_or(0.0),
        })
    }

    /// Value of `metric` for this row
    pub fn metric(&self, metric: RankMetric) -> Option<f64> {
        match metric {
            RankMetric::Return => Some(self.return_pct),
            RankMetric::Volatility => self.volatility,
            RankMetric::Volume => Some(self.avg_volume),
        }
    }
}

impl TableRow for PerformanceRow {
    fn default_columns() -> Vec<String> {
        names(&[
            "Symbol",
            "Start_Price",
            "End_Price",
            "Return (%)",
            "Volatility (%)",
            "Avg_Volume",
        ])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.symbol.as_str().into(),
            self.start_price.into(),
            self.end_price.into(),
            self.return_pct.into(),
            self.volatility.into(),
            self.avg_volume.into(),
        ]
    }
}

/// Sort rows by `metric` in `order`; undefined metrics go last, ties by symbol
pub fn rank(mut rows: Vec<PerformanceRow>, metric: RankMetric, order: RankOrder) -> Vec<PerformanceRow> {
    rows.sort_by(|a, b| {
        compare_metric(a.metric(metric), b.metric(metric), order)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    rows
}

fn compare_metric(a: Option<f64>, b: Option<f64>, order: RankOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match order {
            RankOrder::Best => y.total_cmp(&x),
            RankOrder::Worst => x.total_cmp(&y),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Rank `symbols` by performance over `range`, keeping the first `limit`
///
/// Symbols with fewer than two bars are skipped.
pub async fn rank_performers(
    data: &dyn MarketData,
    symbols: &[String],
    range: DateRange,
    metric: RankMetric,
    order: RankOrder,
    limit: usize,
) -> Result<Vec<PerformanceRow>> {
    let series = try_join_all(
        symbols
            .iter()
            .map(|symbol| data.load_series(symbol, range.start, range.end)),
    )
    .await?;

    let rows: Vec<PerformanceRow> = symbols
        .iter()
        .zip(&series)
        .filter_map(|(symbol, bars)| PerformanceRow::from_series(symbol, bars))
        .collect();

    if rows.is_empty() {
        warn!("No performance data available for period {}", range);
    }

    let mut ranked = rank(rows, metric, order);
    ranked.truncate(limit);
    Ok(ranked)
}
