//! Price and volume spike detection

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::sorted_by_date;
use super::stats::{defined, mean, pct_changes, sample_std};
use crate::error::{QueryError, Result};
use crate::model::PriceBar;
use crate::table::{Cell, TableRow, names};

/// Minimum number of bars to look for spikes in
pub const MIN_SPIKE_ROWS: usize = 5;

/// Default z-score above which a move counts as a spike
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 2.0;

/// A day with an abnormal price or volume move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeRow {
    pub date: NaiveDate,
    pub close: f64,
    pub return_pct: f64,
    pub volume: u64,
    pub volume_change_pct: f64,
    /// "price up", "price down", "volume", or a comma-joined combination
    pub kind: String,
    /// Largest absolute z-score of the two moves
    pub severity: f64,
}

impl TableRow for SpikeRow {
    fn default_columns() -> Vec<String> {
        names(&[
            "Date",
            "Close",
            "Return",
            "Volume",
            "Volume_Change",
            "Type",
            "Severity",
        ])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.close.into(),
            self.return_pct.into(),
            self.volume.into(),
            self.volume_change_pct.into(),
            self.kind.as_str().into(),
            self.severity.into(),
        ]
    }
}

fn z_score(value: f64, mean: f64, std: f64) -> f64 {
    if std > 0.0 {
        ((value - mean) / std).abs()
    } else {
        0.0
    }
}

/// Days whose return or volume change deviates more than `threshold`
/// standard deviations from the series mean
///
/// Fewer than [`MIN_SPIKE_ROWS`] bars is [`QueryError::InsufficientData`].
pub fn detect_spikes(symbol: &str, bars: &[PriceBar], threshold: f64) -> Result<Vec<SpikeRow>> {
    if bars.len() < MIN_SPIKE_ROWS {
        return Err(QueryError::insufficient(symbol, MIN_SPIKE_ROWS, bars.len()));
    }
    let bars = sorted_by_date(bars);

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let returns = pct_changes(&closes);
    let volume_changes = pct_changes(&volumes);

    let return_values = defined(&returns);
    let volume_values = defined(&volume_changes);
    let (ret_mean, ret_std) = (
        mean(&return_values).unwrap_or(0.0),
        sample_std(&return_values).unwrap_or(0.0),
    );
    let (vol_mean, vol_std) = (
        mean(&volume_values).unwrap_or(0.0),
        sample_std(&volume_values).unwrap_or(0.0),
    );

    let mut spikes = Vec::new();
    for ((bar, ret), vol) in bars.iter().zip(&returns).zip(&volume_changes) {
        let (Some(ret), Some(vol)) = (*ret, *vol) else {
            continue;
        };
        let price_z = z_score(ret, ret_mean, ret_std);
        let volume_z = z_score(vol, vol_mean, vol_std);

        let mut kinds = Vec::new();
        if price_z > threshold {
            kinds.push(if ret > 0.0 { "price up" } else { "price down" });
        }
        if volume_z > threshold {
            kinds.push("volume");
        }
        if kinds.is_empty() {
            continue;
        }

        spikes.push(SpikeRow {
            date: bar.date,
            close: bar.close,
            return_pct: ret,
            volume: bar.volume,
            volume_change_pct: vol,
            kind: kinds.join(", "),
            severity: price_z.max(volume_z),
        });
    }
    Ok(spikes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::series;

    #[test]
    fn test_insufficient_rows() {
        let bars = series("TCS.NS", "2024-03-11", &[1.0, 2.0, 3.0, 4.0], &[1, 1, 1, 1]);
        let err = detect_spikes("TCS.NS", &bars, DEFAULT_SPIKE_THRESHOLD).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(err.to_string().contains("TCS.NS"));
    }

    #[test]
    fn test_price_and_volume_spike() {
        let closes = [
            100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 130.0, 131.0,
        ];
        let volumes = [100, 101, 100, 101, 100, 101, 100, 101, 1000, 1001];
        let bars = series("TCS.NS", "2024-03-01", &closes, &volumes);

        let spikes = detect_spikes("TCS.NS", &bars, DEFAULT_SPIKE_THRESHOLD).unwrap();
        assert_eq!(spikes.len(), 1);
        let spike = &spikes[0];
        assert_eq!(spike.close, 130.0);
        assert_eq!(spike.kind, "price up, volume");
        assert!(spike.severity > DEFAULT_SPIKE_THRESHOLD);
    }

    #[test]
    fn test_price_down_spike() {
        let closes = [
            100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 100.0, 101.0, 70.0, 71.0,
        ];
        let bars = series("TCS.NS", "2024-03-01", &closes, &[100; 10]);

        let spikes = detect_spikes("TCS.NS", &bars, DEFAULT_SPIKE_THRESHOLD).unwrap();
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].kind, "price down");
    }

    #[test]
    fn test_flat_series_has_no_spikes() {
        let bars = series("TCS.NS", "2024-03-01", &[50.0; 8], &[10; 8]);
        let spikes = detect_spikes("TCS.NS", &bars, DEFAULT_SPIKE_THRESHOLD).unwrap();
        assert!(spikes.is_empty());
    }
}
