//! Natural-language questions over daily equity prices
//!
//! This crate answers free-text questions such as "top 5 gainers this week"
//! or "compare TCS and INFY" against a table of daily price bars. It includes:
//!
//! - Query understanding: symbol, date range, "top N" and intent extraction
//! - Intent dispatch to one analytic routine per question
//! - Analytics: performance ranking, moving averages, spike detection,
//!   volume analysis, the above-moving-average screen and market summaries
//! - Data access through the [`MarketData`] trait, with in-memory, CSV and
//!   TTL-cached implementations
//! - Chart-ready JSON for results
//!
//! # Example
//!
//! ```rust,ignore
//! use stockq_engine::{ChartDataRenderer, CsvStore, QueryConfig, QueryEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = CsvStore::open("data/prices.csv")?;
//!     let engine = QueryEngine::new(Arc::new(store), QueryConfig::default())
//!         .with_chart_renderer(ChartDataRenderer);
//!
//!     let date = stockq_engine::model::parse_date("2024-03-15")?;
//!     let response = engine.process_query("Which stock gained the most today?", date).await;
//!     println!("{}", response.explanation);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod chart;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod nlp;
pub mod table;

pub use cache::CachedStore;
pub use chart::{ChartDataRenderer, ChartKind, ChartRenderer, ChartRequest, Visualization};
pub use config::QueryConfig;
pub use data::{CsvStore, MarketData, MemoryStore};
pub use engine::{ParsedQuery, QueryEngine, QueryResponse, QueryResult};
pub use error::{QueryError, Result};
pub use model::{DateRange, PriceBar};
pub use nlp::{Intent, Query};
pub use table::{Cell, Table, TableRow};
