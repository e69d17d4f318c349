//! Core data types shared by the resolvers, routines and the engine

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{QueryError, Result};

/// Date format used for every date rendered or parsed by the engine
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| QueryError::InvalidDate(format!("{input}: {e}")))
}

/// One daily price/volume row for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceBar {
    #[serde(deserialize_with = "deserialize_day")]
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(deserialize_with = "deserialize_volume")]
    pub volume: u64,
    #[serde(default)]
    pub symbol: String,
}

impl PriceBar {
    /// Create a bar with all OHLC fields set to `close`
    pub fn flat(symbol: impl Into<String>, date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume,
            symbol: symbol.into(),
        }
    }
}

/// Accepts plain dates as well as timestamps such as `2024-03-15 00:00:00+05:30`
fn deserialize_day<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(serde::de::Error::custom)
}

/// Volumes are sometimes written as floats (`1200.0`)
fn deserialize_volume<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value.round() as u64)
    } else {
        Err(serde::de::Error::custom(format!("invalid volume: {value}")))
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `start <= end`
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Same range with `start` pulled forward to `end` when inverted
    pub fn clamped(self) -> Self {
        if self.is_ordered() {
            self
        } else {
            Self {
                start: self.end,
                end: self.end,
            }
        }
    }

    pub fn start_str(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(day("2024-03-15"), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(matches!(parse_date("15/03/2024"), Err(QueryError::InvalidDate(_))));
    }

    #[test]
    fn test_range_display_and_clamp() {
        let range = DateRange::new(day("2024-03-08"), day("2024-03-15"));
        assert_eq!(range.to_string(), "2024-03-08 to 2024-03-15");
        assert_eq!(range.clamped(), range);

        let inverted = DateRange::new(day("2024-03-12"), day("2024-02-29"));
        assert!(!inverted.is_ordered());
        let clamped = inverted.clamped();
        assert_eq!(clamped.start, day("2024-02-29"));
        assert_eq!(clamped.end, day("2024-02-29"));
    }

    #[test]
    fn test_bar_from_csv_with_timestamp() {
        let data = "Date,Open,High,Low,Close,Volume,Symbol\n\
                    2024-03-15 00:00:00+05:30,10,12,9,11,1500.0,TCS.NS\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let bar: PriceBar = reader.deserialize().next().unwrap().unwrap();

        assert_eq!(bar.date, day("2024-03-15"));
        assert_eq!(bar.volume, 1500);
        assert_eq!(bar.symbol, "TCS.NS");
    }
}
