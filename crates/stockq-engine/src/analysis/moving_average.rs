//! Moving averages and the above-average screen

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::SimpleMovingAverage;
use tracing::{debug, warn};

use super::sorted_by_date;
use crate::data::MarketData;
use crate::error::{QueryError, Result};
use crate::model::PriceBar;
use crate::table::{Cell, TableRow};

/// Default short moving-average window
pub const DEFAULT_SHORT_WINDOW: usize = 5;

/// Default long moving-average window
pub const DEFAULT_LONG_WINDOW: usize = 20;

/// A validated short/long window pair; `short < long` always holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaWindows {
    short: usize,
    long: usize,
}

impl MaWindows {
    /// Pair the windows, falling back to `fallback` unless `0 < short < long`
    pub fn new(short: usize, long: usize, fallback: (usize, usize)) -> Self {
        if short == 0 || short >= long {
            debug!(
                "Rejecting MA windows {}/{}, using {}/{}",
                short, long, fallback.0, fallback.1
            );
            Self::with_defaults(fallback)
        } else {
            Self { short, long }
        }
    }

    fn with_defaults((short, long): (usize, usize)) -> Self {
        if short == 0 || short >= long {
            Self {
                short: DEFAULT_SHORT_WINDOW,
                long: DEFAULT_LONG_WINDOW,
            }
        } else {
            Self { short, long }
        }
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl Default for MaWindows {
    fn default() -> Self {
        Self {
            short: DEFAULT_SHORT_WINDOW,
            long: DEFAULT_LONG_WINDOW,
        }
    }
}

/// One day of a moving-average series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageRow {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub short_ma: f64,
    pub long_ma: f64,
    pub windows: MaWindows,
}

impl TableRow for MovingAverageRow {
    fn default_columns() -> Vec<String> {
        let windows = MaWindows::default();
        ma_columns(windows.short, windows.long)
    }

    fn columns(&self) -> Vec<String> {
        ma_columns(self.windows.short, self.windows.long)
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.close.into(),
            self.volume.into(),
            self.short_ma.into(),
            self.long_ma.into(),
        ]
    }
}

fn ma_columns(short: usize, long: usize) -> Vec<String> {
    vec![
        "Date".to_string(),
        "Close".to_string(),
        "Volume".to_string(),
        format!("MA_{short}"),
        format!("MA_{long}"),
    ]
}

/// Rolling simple moving average; element `i` is the mean of
/// `values[i + 1 - window ..= i]`, so the first `window - 1` inputs yield
/// nothing
fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<f64>> {
    let mut sma =
        SimpleMovingAverage::new(window).map_err(|e| QueryError::Indicator(e.to_string()))?;
    Ok(values
        .iter()
        .map(|v| sma.next(*v))
        .skip(window.saturating_sub(1))
        .collect())
}

/// Short and long moving averages over `bars`
///
/// Only rows where the long window is fully populated are returned; fewer
/// than `windows.long()` bars is [`QueryError::InsufficientData`].
pub fn moving_averages(
    symbol: &str,
    bars: &[PriceBar],
    windows: MaWindows,
) -> Result<Vec<MovingAverageRow>> {
    if bars.len() < windows.long {
        return Err(QueryError::insufficient(symbol, windows.long, bars.len()));
    }
    let bars = sorted_by_date(bars);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let short = rolling_mean(&closes, windows.short)?;
    let long = rolling_mean(&closes, windows.long)?;

    // short has (long - short) more leading values than long
    let offset = windows.long - windows.short;
    Ok(bars
        .iter()
        .skip(windows.long - 1)
        .zip(short.iter().skip(offset))
        .zip(&long)
        .map(|((bar, short_ma), long_ma)| MovingAverageRow {
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            short_ma: *short_ma,
            long_ma: *long_ma,
            windows,
        })
        .collect())
}

/// A symbol closing above its moving average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboveMaRow {
    pub symbol: String,
    pub close: f64,
    pub moving_average: f64,
    pub window: usize,
    /// `(close / ma - 1) * 100`
    pub difference_pct: f64,
}

impl TableRow for AboveMaRow {
    fn default_columns() -> Vec<String> {
        above_ma_columns(10)
    }

    fn columns(&self) -> Vec<String> {
        above_ma_columns(self.window)
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.symbol.as_str().into(),
            self.close.into(),
            self.moving_average.into(),
            self.difference_pct.into(),
        ]
    }
}

fn above_ma_columns(window: usize) -> Vec<String> {
    vec![
        "Symbol".to_string(),
        "Close".to_string(),
        format!("MA_{window}"),
        "Difference (%)".to_string(),
    ]
}

/// Symbols whose close on `date` is above their `window`-day moving average
///
/// `date` must be a trading day with at least `window` earlier trading days;
/// otherwise the screen is empty. Results are sorted by difference,
/// largest first.
pub async fn stocks_above_ma(
    data: &dyn MarketData,
    date: NaiveDate,
    window: usize,
) -> Result<Vec<AboveMaRow>> {
    if window == 0 {
        return Err(QueryError::Indicator("moving average window must be positive".into()));
    }

    let dates = data.list_available_dates().await?;
    let Some(idx) = dates.iter().position(|d| *d == date) else {
        warn!("Date {} is not a trading day", date);
        return Ok(Vec::new());
    };
    if idx < window {
        warn!(
            "Not enough history before {} for a {}-day moving average",
            date, window
        );
        return Ok(Vec::new());
    }
    let start = dates[idx - window];

    let symbols = data.list_catalog_symbols(Some(date)).await?;
    let series = try_join_all(
        symbols
            .iter()
            .map(|symbol| data.load_series(symbol, start, date)),
    )
    .await?;

    let mut rows = Vec::new();
    for (symbol, bars) in symbols.iter().zip(&series) {
        if bars.len() < window {
            continue;
        }
        let bars = sorted_by_date(bars);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (Some(&ma), Some(&close)) = (rolling_mean(&closes, window)?.last(), closes.last())
        else {
            continue;
        };
        if close > ma {
            rows.push(AboveMaRow {
                symbol: symbol.clone(),
                close,
                moving_average: ma,
                window,
                difference_pct: (close / ma - 1.0) * 100.0,
            });
        }
    }

    rows.sort_by(|a, b| {
        b.difference_pct
            .total_cmp(&a.difference_pct)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    Ok(rows)
}
