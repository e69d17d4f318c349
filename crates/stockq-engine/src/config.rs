//! Configuration for query processing

use crate::error::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Symbols used to fill out a comparison when only one stock is named
pub const DEFAULT_POPULAR_SYMBOLS: &[&str] = &["RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "INFY.NS"];

/// Configuration for the query engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// "Top N" used when the query names no number
    pub default_limit: usize,

    /// Short moving-average window
    pub short_window: usize,

    /// Long moving-average window
    pub long_window: usize,

    /// Window for the "trading above N-day average" screen
    pub screen_ma_window: usize,

    /// Z-score above which a row counts as a spike
    pub spike_threshold: f64,

    /// Maximum number of symbols in one comparison
    pub max_compare_symbols: usize,

    /// How many popular symbols are added to a single-symbol comparison
    pub compare_augment_count: usize,

    /// Shortlist used to augment comparisons
    pub popular_symbols: Vec<String>,

    /// Currency prefix used in text answers
    pub currency_symbol: String,

    /// TTL for cached collaborator reads
    pub cache_ttl: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            short_window: 5,
            long_window: 20,
            screen_ma_window: 10,
            spike_threshold: 2.0,
            max_compare_symbols: 5,
            compare_augment_count: 2,
            popular_symbols: DEFAULT_POPULAR_SYMBOLS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            currency_symbol: "₹".to_string(),
            cache_ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl QueryConfig {
    /// Create a new configuration builder
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::default()
    }

    /// Apply `STOCKQ_POPULAR_SYMBOLS` and `STOCKQ_CURRENCY` overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(list) = std::env::var("STOCKQ_POPULAR_SYMBOLS") {
            self.popular_symbols = parse_symbol_list(&list);
        }
        if let Ok(currency) = std::env::var("STOCKQ_CURRENCY") {
            self.currency_symbol = currency;
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.short_window == 0 || self.long_window == 0 || self.screen_ma_window == 0 {
            return Err(QueryError::Config(
                "moving-average windows must be greater than 0".to_string(),
            ));
        }

        if self.short_window >= self.long_window {
            return Err(QueryError::Config(format!(
                "short_window ({}) must be less than long_window ({})",
                self.short_window, self.long_window
            )));
        }

        if self.spike_threshold.is_nan() || self.spike_threshold <= 0.0 {
            return Err(QueryError::Config(
                "spike_threshold must be a positive number".to_string(),
            ));
        }

        if self.max_compare_symbols < 2 {
            return Err(QueryError::Config(
                "max_compare_symbols must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_symbol_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// Builder for QueryConfig
#[derive(Debug, Default)]
pub struct QueryConfigBuilder {
    default_limit: Option<usize>,
    short_window: Option<usize>,
    long_window: Option<usize>,
    screen_ma_window: Option<usize>,
    spike_threshold: Option<f64>,
    max_compare_symbols: Option<usize>,
    compare_augment_count: Option<usize>,
    popular_symbols: Option<Vec<String>>,
    currency_symbol: Option<String>,
    cache_ttl: Option<Duration>,
}

impl QueryConfigBuilder {
    /// Set the default "top N"
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = Some(limit);
        self
    }

    /// Set the default short/long moving-average windows
    pub fn ma_windows(mut self, short: usize, long: usize) -> Self {
        self.short_window = Some(short);
        self.long_window = Some(long);
        self
    }

    /// Set the default window for the above-average screen
    pub fn screen_ma_window(mut self, window: usize) -> Self {
        self.screen_ma_window = Some(window);
        self
    }

    /// Set the spike z-score threshold
    pub fn spike_threshold(mut self, threshold: f64) -> Self {
        self.spike_threshold = Some(threshold);
        self
    }

    /// Set the comparison cap
    pub fn max_compare_symbols(mut self, max: usize) -> Self {
        self.max_compare_symbols = Some(max);
        self
    }

    /// Set how many popular symbols augment a one-symbol comparison
    pub fn compare_augment_count(mut self, count: usize) -> Self {
        self.compare_augment_count = Some(count);
        self
    }

    /// Set the popular-symbol shortlist
    pub fn popular_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.popular_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the currency prefix
    pub fn currency_symbol(mut self, currency: impl Into<String>) -> Self {
        self.currency_symbol = Some(currency.into());
        self
    }

    /// Set the cache TTL
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<QueryConfig> {
        let defaults = QueryConfig::default();

        let config = QueryConfig {
            default_limit: self.default_limit.unwrap_or(defaults.default_limit),
            short_window: self.short_window.unwrap_or(defaults.short_window),
            long_window: self.long_window.unwrap_or(defaults.long_window),
            screen_ma_window: self.screen_ma_window.unwrap_or(defaults.screen_ma_window),
            spike_threshold: self.spike_threshold.unwrap_or(defaults.spike_threshold),
            max_compare_symbols: self
                .max_compare_symbols
                .unwrap_or(defaults.max_compare_symbols),
            compare_augment_count: self
                .compare_augment_count
                .unwrap_or(defaults.compare_augment_count),
            popular_symbols: self.popular_symbols.unwrap_or(defaults.popular_symbols),
            currency_symbol: self.currency_symbol.unwrap_or(defaults.currency_symbol),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryConfig::default();
        assert_eq!(config.default_limit, 5);
        assert_eq!((config.short_window, config.long_window), (5, 20));
        assert_eq!(config.popular_symbols.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = QueryConfig::builder()
            .default_limit(10)
            .ma_windows(10, 50)
            .popular_symbols(["AAPL", "MSFT"])
            .currency_symbol("$")
            .build()
            .unwrap();

        assert_eq!(config.default_limit, 10);
        assert_eq!(config.long_window, 50);
        assert_eq!(config.popular_symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.currency_symbol, "$");
    }

    #[test]
    fn test_validation_rejects_inverted_windows() {
        let result = QueryConfig::builder().ma_windows(20, 5).build();
        assert!(matches!(result, Err(QueryError::Config(_))));
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        let config = QueryConfig {
            spike_threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_small_compare_cap() {
        let config = QueryConfig {
            max_compare_symbols: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_symbol_list() {
        assert_eq!(
            parse_symbol_list(" tcs.ns, ,infy.ns "),
            vec!["TCS.NS".to_string(), "INFY.NS".to_string()]
        );
    }
}
