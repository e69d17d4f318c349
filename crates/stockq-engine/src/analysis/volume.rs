//! Volume analysis

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::SimpleMovingAverage;

use super::sorted_by_date;
use super::stats::{mean, pct_changes, pearson};
use crate::error::{QueryError, Result};
use crate::model::PriceBar;
use crate::table::{Cell, TableRow, names};

/// Window of the volume moving average
pub const VOLUME_MA_WINDOW: usize = 5;

/// Minimum paired observations for a volume/price correlation
const MIN_CORRELATION_PAIRS: usize = 3;

/// One day of a symbol's volume profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub volume_ma: Option<f64>,
    pub volume_change_pct: Option<f64>,
    /// Correlation of daily price and volume changes over the whole range,
    /// repeated on every row
    pub volume_price_corr: Option<f64>,
}

impl TableRow for VolumeRow {
    fn default_columns() -> Vec<String> {
        names(&[
            "Date",
            "Close",
            "Volume",
            "Volume_MA_5",
            "Volume_Change",
            "Volume_Price_Corr",
        ])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.close.into(),
            self.volume.into(),
            self.volume_ma.into(),
            self.volume_change_pct.into(),
            self.volume_price_corr.into(),
        ]
    }
}

/// Volume profile of one symbol; an empty series is
/// [`QueryError::InsufficientData`]
pub fn analyze_volume(symbol: &str, bars: &[PriceBar]) -> Result<Vec<VolumeRow>> {
    if bars.is_empty() {
        return Err(QueryError::insufficient(symbol, 1, 0));
    }
    let bars = sorted_by_date(bars);

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

    let mut sma = SimpleMovingAverage::new(VOLUME_MA_WINDOW)
        .map_err(|e| QueryError::Indicator(e.to_string()))?;
    let volume_ma: Vec<Option<f64>> = volumes
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let avg = sma.next(*v);
            (i + 1 >= VOLUME_MA_WINDOW).then_some(avg)
        })
        .collect();

    let price_changes = pct_changes(&closes);
    let volume_changes = pct_changes(&volumes);
    let corr = correlation(&price_changes, &volume_changes);

    Ok(bars
        .iter()
        .zip(volume_ma)
        .zip(volume_changes)
        .map(|((bar, volume_ma), volume_change_pct)| VolumeRow {
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            volume_ma,
            volume_change_pct,
            volume_price_corr: corr,
        })
        .collect())
}

fn correlation(price: &[Option<f64>], volume: &[Option<f64>]) -> Option<f64> {
    if price.len() < MIN_CORRELATION_PAIRS {
        return None;
    }
    let pairs: Vec<(f64, f64)> = price
        .iter()
        .zip(volume)
        .filter_map(|(p, v)| Some(((*p)?, (*v)?)))
        .collect();
    if pairs.len() < MIN_CORRELATION_PAIRS {
        return None;
    }
    pearson(&pairs)
}

/// Average traded volume of a symbol on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeLeader {
    pub symbol: String,
    pub volume: f64,
}

impl TableRow for VolumeLeader {
    fn default_columns() -> Vec<String> {
        names(&["Symbol", "Volume"])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![self.symbol.as_str().into(), self.volume.into()]
    }
}

/// The `limit` symbols with the highest volume in one day's bars
pub fn volume_leaders(day_bars: &[PriceBar], limit: usize) -> Vec<VolumeLeader> {
    let mut by_symbol: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for bar in day_bars {
        by_symbol
            .entry(bar.symbol.as_str())
            .or_default()
            .push(bar.volume as f64);
    }

    let mut leaders: Vec<VolumeLeader> = by_symbol
        .into_iter()
        .filter_map(|(symbol, volumes)| {
            Some(VolumeLeader {
                symbol: symbol.to_string(),
                volume: mean(&volumes)?,
            })
        })
        .collect();
    leaders.sort_by(|a, b| {
        b.volume
            .total_cmp(&a.volume)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    leaders.truncate(limit);
    leaders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{day, series};

    #[test]
    fn test_volume_profile() {
        let bars = series(
            "TCS.NS",
            "2024-03-01",
            &[10.0, 11.0, 12.0, 11.0, 13.0, 14.0],
            &[100, 200, 300, 200, 400, 500],
        );
        let rows = analyze_volume("TCS.NS", &bars).unwrap();
        assert_eq!(rows.len(), 6);

        assert!(rows[3].volume_ma.is_none());
        assert!((rows[4].volume_ma.unwrap() - 240.0).abs() < 1e-9);
        assert!((rows[5].volume_ma.unwrap() - 320.0).abs() < 1e-9);

        assert!(rows[0].volume_change_pct.is_none());
        assert!((rows[1].volume_change_pct.unwrap() - 100.0).abs() < 1e-9);

        // price and volume move together
        let corr = rows[0].volume_price_corr.unwrap();
        assert!(corr > 0.8);
        assert!(rows.iter().all(|r| r.volume_price_corr == Some(corr)));
    }

    #[test]
    fn test_short_series_has_no_correlation() {
        let bars = series("TCS.NS", "2024-03-01", &[10.0, 11.0], &[100, 200]);
        let rows = analyze_volume("TCS.NS", &bars).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].volume_price_corr.is_none());

        assert!(analyze_volume("TCS.NS", &[]).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_volume_leaders() {
        let date = day("2024-03-15");
        let bars = vec![
            PriceBar::flat("A.NS", date, 1.0, 10),
            PriceBar::flat("B.NS", date, 1.0, 30),
            PriceBar::flat("C.NS", date, 1.0, 20),
        ];
        let leaders = volume_leaders(&bars, 2);
        let symbols: Vec<_> = leaders.iter().map(|l| l.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B.NS", "C.NS"]);
    }
}
