//! Query result types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::chart::Visualization;
use crate::model::DateRange;
use crate::nlp::{Intent, Query};
use crate::table::Table;

/// Signals extracted from one query, each independently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub query: Query,
    pub context_date: NaiveDate,
    pub intent: Intent,
    pub range: DateRange,
    pub symbols: Vec<String>,
    pub limit: usize,
}

impl ParsedQuery {
    /// First resolved symbol, the subject of single-symbol intents
    pub fn primary_symbol(&self) -> Option<&str> {
        self.symbols.first().map(String::as_str)
    }
}

/// Outcome of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Table(Table),
    Text(String),
    /// Nothing to show; `reason` says why
    NoResult { reason: String },
}

impl QueryResult {
    pub fn is_no_result(&self) -> bool {
        matches!(self, Self::NoResult { .. })
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Number of table rows, zero for text and no-result outcomes
    pub fn row_count(&self) -> usize {
        self.as_table().map_or(0, Table::len)
    }
}

/// Result, explanation and optional chart for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub result: QueryResult,
    /// Always set; on failure this is the error message
    pub explanation: String,
    pub visualization: Option<Visualization>,
    pub parsed: Option<ParsedQuery>,
}

impl QueryResponse {
    pub fn new(result: QueryResult, explanation: impl Into<String>) -> Self {
        Self {
            result,
            explanation: explanation.into(),
            visualization: None,
            parsed: None,
        }
    }

    pub fn table(table: Table, explanation: impl Into<String>) -> Self {
        Self::new(QueryResult::Table(table), explanation)
    }

    pub fn text(text: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self::new(QueryResult::Text(text.into()), explanation)
    }

    /// A response with no result whose explanation is `reason`
    pub fn no_result(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(
            QueryResult::NoResult {
                reason: reason.clone(),
            },
            reason,
        )
    }

    pub fn with_visualization(mut self, visualization: Option<Visualization>) -> Self {
        self.visualization = visualization;
        self
    }

    pub fn with_parsed(mut self, parsed: ParsedQuery) -> Self {
        self.parsed = Some(parsed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_result_explains_itself() {
        let response = QueryResponse::no_result("No data available for 2024-03-15.");
        assert!(response.result.is_no_result());
        assert_eq!(response.explanation, "No data available for 2024-03-15.");
        assert!(response.visualization.is_none());
    }

    #[test]
    fn test_result_serialization() {
        let response = QueryResponse::text("The latest price", "Showing current price for TCS.NS");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["result"]["kind"], "text");
        assert_eq!(json["result"]["value"], "The latest price");

        let json = serde_json::to_value(QueryResult::NoResult { reason: "none".into() }).unwrap();
        assert_eq!(json["kind"], "no_result");
        assert_eq!(json["value"]["reason"], "none");
    }
}
