//! Analytic routines over daily price series
//!
//! Single-series routines are pure functions over `&[PriceBar]`. Routines
//! that span the whole catalog (ranking, screens, market summary) take a
//! [`MarketData`](crate::data::MarketData) and load each symbol
//! independently; their output order is fixed by a final sort, never by the
//! order loads complete in.

pub mod market;
pub mod moving_average;
pub mod performance;
pub mod spikes;
pub mod stats;
pub mod volume;

pub use market::{MarketSummary, PriceChange, SymbolSummary, daily_price_changes, price_changes};
pub use moving_average::{
    AboveMaRow, MaWindows, MovingAverageRow, moving_averages, stocks_above_ma,
};
pub use performance::{PerformanceRow, RankMetric, RankOrder, rank_performers};
pub use spikes::{DEFAULT_SPIKE_THRESHOLD, MIN_SPIKE_ROWS, SpikeRow, detect_spikes};
pub use volume::{VolumeLeader, VolumeRow, analyze_volume, volume_leaders};

use crate::model::PriceBar;

/// Bars sorted by date, borrowed when already in order
pub(crate) fn sorted_by_date(bars: &[PriceBar]) -> std::borrow::Cow<'_, [PriceBar]> {
    if bars.windows(2).all(|w| w[0].date <= w[1].date) {
        std::borrow::Cow::Borrowed(bars)
    } else {
        let mut owned = bars.to_vec();
        owned.sort_by_key(|b| b.date);
        std::borrow::Cow::Owned(owned)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Days, NaiveDate};

    use crate::model::PriceBar;

    pub fn day(s: &str) -> NaiveDate {
        crate::model::parse_date(s).unwrap()
    }

    /// Consecutive daily bars starting at `start`
    pub fn series(symbol: &str, start: &str, closes: &[f64], volumes: &[u64]) -> Vec<PriceBar> {
        let start = day(start);
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (close, volume))| {
                let date = start.checked_add_days(Days::new(i as u64)).unwrap();
                PriceBar {
                    date,
                    open: *close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close: *close,
                    volume: *volume,
                    symbol: symbol.to_string(),
                }
            })
            .collect()
    }
}
