//! Query understanding
//!
//! Each extractor runs independently over the same normalized text:
//!
//! - [`symbols`]: ticker mentions matched against the catalog
//! - [`temporal`]: relative/explicit time phrases resolved to a [`DateRange`]
//! - [`quantity`]: the "top N" limit
//! - [`intent`]: ordered pattern-table classification
//!
//! [`DateRange`]: crate::model::DateRange

pub mod intent;
pub mod quantity;
pub mod symbols;
pub mod temporal;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub use intent::{Intent, classify};
pub use quantity::{
    DEFAULT_LIMIT, extract_day_window, extract_limit, extract_limit_or, extract_ma_windows,
};
pub use symbols::{SymbolCatalog, resolve_symbols};
pub use temporal::{DEFAULT_LOOKBACK_DAYS, resolve_range};

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.]").expect("valid punctuation pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Lowercase, replace punctuation (except dots) with spaces, collapse whitespace
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let spaced = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// A user question in raw and normalized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    raw: String,
    normalized: String,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_symbol_dots() {
        assert_eq!(
            normalize("  What's the price of RELIANCE.NS?!  "),
            "what s the price of reliance.ns"
        );
    }

    #[test]
    fn test_normalize_splits_hyphens() {
        assert_eq!(
            normalize("Top 5 stocks above their 10-day average"),
            "top 5 stocks above their 10 day average"
        );
    }

    #[test]
    fn test_query_holds_both_forms() {
        let query = Query::new("Compare TCS,  INFY");
        assert_eq!(query.raw(), "Compare TCS,  INFY");
        assert_eq!(query.normalized(), "compare tcs infy");
    }
}
