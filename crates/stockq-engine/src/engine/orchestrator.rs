//! Intent dispatch
//!
//! [`QueryEngine`] extracts every signal from the query up front, then hands
//! the [`ParsedQuery`] to exactly one analytic routine chosen by intent.
//! Missing inputs and thin data become [`QueryResult::NoResult`](super::QueryResult::NoResult) with a
//! guidance message; any other error is caught at [`QueryEngine::process_query`]
//! and reported the same way.

use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::result::{ParsedQuery, QueryResponse};
use crate::analysis::{
    AboveMaRow, MaWindows, MarketSummary, PerformanceRow, RankMetric, RankOrder, SymbolSummary,
    MIN_SPIKE_ROWS, analyze_volume, daily_price_changes, detect_spikes, moving_averages, rank_performers,
    stocks_above_ma, volume_leaders,
};
use crate::chart::{ChartRenderer, ChartRequest, Visualization};
use crate::config::QueryConfig;
use crate::data::MarketData;
use crate::error::{QueryError, Result};
use crate::nlp::{
    Intent, Query, classify, extract_day_window, extract_limit_or, extract_ma_windows,
    resolve_range, resolve_symbols,
};
use crate::model::PriceBar;
use crate::table::Table;

const NO_SYMBOL: &str =
    "Could not identify any stock symbols in your query. Please specify a stock symbol.";
const NOT_ENOUGH_TO_COMPARE: &str = "Could not identify enough stock symbols to compare. Please specify at least two stock symbols.";

/// Answers natural-language questions over a [`MarketData`] source
pub struct QueryEngine {
    data: Arc<dyn MarketData>,
    config: QueryConfig,
    charts: Option<Arc<dyn ChartRenderer>>,
}

impl QueryEngine {
    pub fn new(data: Arc<dyn MarketData>, config: QueryConfig) -> Self {
        Self {
            data,
            config,
            charts: None,
        }
    }

    /// Attach a chart renderer; without one every response has no visualization
    pub fn with_chart_renderer(mut self, renderer: impl ChartRenderer + 'static) -> Self {
        self.charts = Some(Arc::new(renderer));
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Answer `text` as of `context_date`
    ///
    /// Never fails: errors are turned into a no-result response whose
    /// explanation carries the error text.
    pub async fn process_query(&self, text: &str, context_date: NaiveDate) -> QueryResponse {
        match self.try_process(text, context_date).await {
            Ok(response) => response,
            Err(e) => {
                error!("Error processing query: {}", e);
                QueryResponse::no_result(format!(
                    "An error occurred while processing your query: {e}"
                ))
            }
        }
    }

    async fn try_process(&self, text: &str, context_date: NaiveDate) -> Result<QueryResponse> {
        let (parsed, catalog) = self.parse_with_catalog(text, context_date).await?;
        let response = self.dispatch(&parsed, &catalog).await?;
        Ok(response.with_parsed(parsed))
    }

    /// Extract intent, range, symbols and limit without running anything
    pub async fn parse(&self, text: &str, context_date: NaiveDate) -> Result<ParsedQuery> {
        Ok(self.parse_with_catalog(text, context_date).await?.0)
    }

    async fn parse_with_catalog(
        &self,
        text: &str,
        context_date: NaiveDate,
    ) -> Result<(ParsedQuery, Vec<String>)> {
        let query = Query::new(text);
        let normalized = query.normalized();
        info!("Processed query: {}", normalized);

        let catalog = self.data.list_catalog_symbols(None).await?;
        let dates = self.data.list_available_dates().await?;

        let mut range = resolve_range(normalized, context_date, &dates);
        if !range.is_ordered() {
            warn!("Resolved range {} is inverted, clamping start to end", range);
            range = range.clamped();
        }
        let symbols = resolve_symbols(normalized, &catalog);
        let mut limit = extract_limit_or(normalized, self.config.default_limit);
        if !catalog.is_empty() && limit > catalog.len() {
            limit = catalog.len();
        }
        let intent = classify(normalized);

        info!("Query intent: {}", intent);
        info!("Date range: {}", range);
        info!("Detected symbols: {:?}", symbols);
        info!("Limit: {}", limit);

        let parsed = ParsedQuery {
            query,
            context_date,
            intent,
            range,
            symbols,
            limit,
        };
        Ok((parsed, catalog))
    }

    async fn dispatch(&self, parsed: &ParsedQuery, catalog: &[String]) -> Result<QueryResponse> {
        match parsed.intent {
            Intent::TopGainers => self.ranking(parsed, catalog, RankOrder::Best).await,
            Intent::TopLosers => self.ranking(parsed, catalog, RankOrder::Worst).await,
            Intent::PriceTrend => self.price_trend(parsed).await,
            Intent::CompareStocks => self.compare(parsed, catalog).await,
            Intent::MovingAverage => self.moving_average(parsed).await,
            Intent::VolumeAnalysis => self.volume(parsed).await,
            Intent::PriceSpike => self.spikes(parsed).await,
            Intent::CurrentPrice => self.current_price(parsed).await,
            Intent::GeneralInfo => self.general_info(parsed).await,
        }
    }

    fn chart(&self, request: ChartRequest<'_>) -> Option<Visualization> {
        self.charts.as_ref()?.render(&request)
    }

    async fn ranking(
        &self,
        parsed: &ParsedQuery,
        catalog: &[String],
        order: RankOrder,
    ) -> Result<QueryResponse> {
        let rows = rank_performers(
            self.data.as_ref(),
            catalog,
            parsed.range,
            RankMetric::Return,
            order,
            parsed.limit,
        )
        .await?;

        let direction = match order {
            RankOrder::Best => "gaining",
            RankOrder::Worst => "losing",
        };
        let explanation = format!(
            "Showing the top {} {direction} stocks from {} to {}",
            parsed.limit,
            parsed.range.start_str(),
            parsed.range.end_str()
        );
        let visualization = self.chart(ChartRequest::Ranking {
            metric: RankMetric::Return.label(),
            order,
            points: rows
                .iter()
                .map(|r: &PerformanceRow| (r.symbol.clone(), r.return_pct))
                .collect(),
        });

        Ok(QueryResponse::table(Table::from_rows(&rows), explanation)
            .with_visualization(visualization))
    }

    async fn price_trend(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            return Ok(QueryResponse::no_result(NO_SYMBOL));
        };
        let range = parsed.range;
        let bars = self.data.load_series(symbol, range.start, range.end).await?;

        let explanation = format!(
            "Showing price trend for {symbol} from {} to {}",
            range.start_str(),
            range.end_str()
        );
        let visualization = self.chart(ChartRequest::Price {
            symbol,
            range,
            bars: &bars,
            highlights: &[],
        });
        Ok(QueryResponse::table(Table::from_rows(&bars), explanation)
            .with_visualization(visualization))
    }

    /// Symbols to compare: the resolved ones, topped up from the popular
    /// shortlist when only one was named, capped at the configured maximum
    fn comparison_symbols(&self, resolved: &[String], catalog: &[String]) -> Vec<String> {
        let mut symbols = resolved.to_vec();
        if let [only] = resolved {
            symbols.extend(
                self.config
                    .popular_symbols
                    .iter()
                    .filter(|s| *s != only && catalog.contains(*s))
                    .take(self.config.compare_augment_count)
                    .cloned(),
            );
        }
        symbols.truncate(self.config.max_compare_symbols);
        symbols
    }

    async fn compare(&self, parsed: &ParsedQuery, catalog: &[String]) -> Result<QueryResponse> {
        let symbols = self.comparison_symbols(&parsed.symbols, catalog);
        if symbols.len() < 2 {
            return Ok(QueryResponse::no_result(NOT_ENOUGH_TO_COMPARE));
        }

        let range = parsed.range;
        let loaded = try_join_all(
            symbols
                .iter()
                .map(|symbol| self.data.load_series(symbol, range.start, range.end)),
        )
        .await?;
        let series: Vec<(String, Vec<PriceBar>)> = symbols.iter().cloned().zip(loaded).collect();

        let mut rows: Vec<PriceBar> = Vec::new();
        for (symbol, bars) in &series {
            if bars.is_empty() {
                warn!("No data available for {} from {}", symbol, range);
            }
            rows.extend(bars.iter().cloned());
        }

        let explanation = format!(
            "Comparing performance of {} from {} to {}",
            symbols.join(", "),
            range.start_str(),
            range.end_str()
        );
        let visualization = self.chart(ChartRequest::Comparison {
            range,
            series: &series,
        });
        Ok(QueryResponse::table(Table::from_rows(&rows), explanation)
            .with_visualization(visualization))
    }

    async fn moving_average(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            let text = parsed.query.normalized();
            if text.contains("above") || text.contains("over") {
                return self.above_moving_average(parsed).await;
            }
            return Ok(QueryResponse::no_result(
                "Could not identify any stock symbols in your query. Please specify a stock symbol for moving average analysis.",
            ));
        };

        let defaults = (self.config.short_window, self.config.long_window);
        let (short, long) = extract_ma_windows(parsed.query.normalized());
        let windows = MaWindows::new(
            short.unwrap_or(defaults.0),
            long.unwrap_or(defaults.1),
            defaults,
        );

        let range = parsed.range;
        let bars = self.data.load_series(symbol, range.start, range.end).await?;
        let rows = match moving_averages(symbol, &bars, windows) {
            Ok(rows) => rows,
            Err(e) if e.is_insufficient_data() => {
                warn!("{}", e);
                return Ok(QueryResponse::no_result(format!(
                    "Insufficient data to calculate moving averages for {symbol}."
                )));
            }
            Err(e) => return Err(e),
        };

        let explanation = format!(
            "Showing {}-day and {}-day moving averages for {symbol} from {} to {}",
            windows.short(),
            windows.long(),
            range.start_str(),
            range.end_str()
        );
        let visualization = self.chart(ChartRequest::MovingAverages {
            symbol,
            rows: &rows,
        });
        Ok(QueryResponse::table(Table::from_rows(&rows), explanation)
            .with_visualization(visualization))
    }

    async fn above_moving_average(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let window =
            extract_day_window(parsed.query.normalized()).unwrap_or(self.config.screen_ma_window);
        let date = parsed.context_date;

        let mut rows = match stocks_above_ma(self.data.as_ref(), date, window).await {
            Ok(rows) => rows,
            Err(QueryError::Indicator(e)) => {
                warn!("Moving average screen failed: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if rows.is_empty() {
            return Ok(QueryResponse::no_result(format!(
                "Could not find stocks trading above their {window}-day moving average."
            )));
        }
        rows.truncate(parsed.limit);

        let explanation = format!(
            "Showing top {} stocks trading above their {window}-day moving average as of {date}",
            parsed.limit
        );
        let visualization = self.chart(ChartRequest::Ranking {
            metric: "Difference (%)",
            order: RankOrder::Best,
            points: rows
                .iter()
                .map(|r: &AboveMaRow| (r.symbol.clone(), r.difference_pct))
                .collect(),
        });
        Ok(QueryResponse::table(Table::from_rows(&rows), explanation)
            .with_visualization(visualization))
    }

    async fn volume(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            let date = parsed.context_date;
            let day = self.data.load_day(date).await?;
            if day.is_empty() {
                return Ok(QueryResponse::no_result(format!(
                    "No data available for {date}."
                )));
            }
            let leaders = volume_leaders(&day, parsed.limit);
            return Ok(QueryResponse::table(
                Table::from_rows(&leaders),
                format!("Showing stocks with high trading volume as of {date}"),
            ));
        };

        let range = parsed.range;
        let bars = self.data.load_series(symbol, range.start, range.end).await?;
        let rows = match analyze_volume(symbol, &bars) {
            Ok(rows) => rows,
            Err(e) if e.is_insufficient_data() => {
                warn!("{}", e);
                return Ok(QueryResponse::no_result(format!(
                    "Insufficient data to analyze volume for {symbol}."
                )));
            }
            Err(e) => return Err(e),
        };

        let explanation = format!(
            "Showing volume analysis for {symbol} from {} to {}",
            range.start_str(),
            range.end_str()
        );
        let visualization = self.chart(ChartRequest::Volume {
            symbol,
            rows: &rows,
        });
        Ok(QueryResponse::table(Table::from_rows(&rows), explanation)
            .with_visualization(visualization))
    }

    async fn spikes(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            return Ok(QueryResponse::no_result(
                "Could not identify any stock symbols in your query. Please specify a stock symbol for spike detection.",
            ));
        };

        let range = parsed.range;
        let bars = self.data.load_series(symbol, range.start, range.end).await?;
        let spikes = match detect_spikes(symbol, &bars, self.config.spike_threshold) {
            Ok(spikes) => spikes,
            Err(e) if e.is_insufficient_data() => {
                warn!("{}", e);
                return Ok(QueryResponse::no_result(format!(
                    "Insufficient data to detect spikes for {symbol}: need at least {MIN_SPIKE_ROWS} rows."
                )));
            }
            Err(e) => return Err(e),
        };
        if spikes.is_empty() {
            return Ok(QueryResponse::no_result(format!(
                "No significant price or volume spikes detected for {symbol} in the specified period."
            )));
        }

        let explanation = format!(
            "Showing detected price and volume spikes for {symbol} from {} to {}",
            range.start_str(),
            range.end_str()
        );
        let highlights: Vec<NaiveDate> = spikes.iter().map(|s| s.date).collect();
        let visualization = self.chart(ChartRequest::Price {
            symbol,
            range,
            bars: &bars,
            highlights: &highlights,
        });
        Ok(QueryResponse::table(Table::from_rows(&spikes), explanation)
            .with_visualization(visualization))
    }

    async fn current_price(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            return Ok(QueryResponse::no_result(NO_SYMBOL));
        };
        let date = parsed.context_date;

        let day = self.data.load_day(date).await?;
        if day.is_empty() {
            return Ok(QueryResponse::no_result(format!(
                "No data available for {date}."
            )));
        }
        let Some(bar) = day.iter().find(|b| b.symbol == symbol) else {
            return Ok(QueryResponse::no_result(format!(
                "No data available for {symbol} on {date}."
            )));
        };

        Ok(QueryResponse::text(
            format!(
                "The latest price of {symbol} as of {date} is {}{:.2}",
                self.config.currency_symbol, bar.close
            ),
            format!("Showing current price for {symbol}"),
        ))
    }

    async fn general_info(&self, parsed: &ParsedQuery) -> Result<QueryResponse> {
        let Some(symbol) = parsed.primary_symbol() else {
            return self.market_summary(parsed.context_date).await;
        };

        let range = parsed.range;
        let bars = self.data.load_series(symbol, range.start, range.end).await?;
        let Some(summary) = SymbolSummary::from_series(symbol, range, &bars) else {
            return Ok(QueryResponse::no_result(format!(
                "No data available for {symbol} from {} to {}.",
                range.start_str(),
                range.end_str()
            )));
        };

        let explanation = format!(
            "Showing general information for {symbol} from {} to {}",
            range.start_str(),
            range.end_str()
        );
        let visualization = self.chart(ChartRequest::Price {
            symbol,
            range,
            bars: &bars,
            highlights: &[],
        });
        Ok(QueryResponse::text(summary.render(&self.config.currency_symbol), explanation)
            .with_visualization(visualization))
    }

    async fn market_summary(&self, date: NaiveDate) -> Result<QueryResponse> {
        let day = self.data.load_day(date).await?;
        if day.is_empty() {
            return Ok(QueryResponse::no_result(format!(
                "No data available for {date}."
            )));
        }

        let changes = daily_price_changes(self.data.as_ref(), date).await?;
        let Some(summary) = MarketSummary::from_changes(date, &changes) else {
            return Ok(QueryResponse::no_result(format!(
                "Could not calculate price changes for {date}."
            )));
        };

        Ok(QueryResponse::text(
            summary.to_string(),
            format!("Showing market summary for {date}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartDataRenderer, ChartKind};
    use crate::data::{MemoryStore, MockMarketData};
    use crate::engine::QueryResult;
    use crate::model::parse_date;
    use chrono::Days;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    /// Daily bars from 2024-02-01 to 2024-03-15; ITC.NS stops a day early
    /// and TCS.NS steps up by 20 on 2024-03-13
    fn store() -> MemoryStore {
        let symbols = [
            ("TCS.NS", 100.0, 1.0),
            ("RELIANCE.NS", 200.0, 0.5),
            ("HDFCBANK.NS", 150.0, 3.0),
            ("INFY.NS", 50.0, 0.2),
            ("WIPRO.NS", 80.0, -0.5),
            ("ITC.NS", 40.0, 0.1),
        ];
        let first = day("2024-02-01");
        let step = day("2024-03-13");
        let mut store = MemoryStore::new();
        for (i, (symbol, base, slope)) in symbols.iter().enumerate() {
            let last_day = if *symbol == "ITC.NS" { 42 } else { 43 };
            for t in 0..=last_day {
                let date = first.checked_add_days(Days::new(t)).unwrap();
                let mut close = base + slope * t as f64;
                if *symbol == "TCS.NS" && date >= step {
                    close += 20.0;
                }
                store.insert(PriceBar {
                    date,
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000 + i as u64 * 100,
                    symbol: (*symbol).to_string(),
                });
            }
        }
        store
    }

    fn engine() -> QueryEngine {
        QueryEngine::new(Arc::new(store()), QueryConfig::default())
    }

    async fn ask(engine: &QueryEngine, text: &str) -> QueryResponse {
        engine.process_query(text, day("2024-03-15")).await
    }

    #[tokio::test]
    async fn test_top_gainers_today() {
        let engine = engine().with_chart_renderer(ChartDataRenderer);
        let response = ask(&engine, "Which stock gained the most today?").await;

        let parsed = response.parsed.as_ref().unwrap();
        assert_eq!(parsed.intent, Intent::TopGainers);
        assert_eq!(parsed.range.start_str(), "2024-03-08");
        assert_eq!(parsed.range.end_str(), "2024-03-15");
        assert_eq!(parsed.limit, 5);

        let table = response.result.as_table().unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.rows[0][0].to_string(), "TCS.NS");
        assert_eq!(
            response.explanation,
            "Showing the top 5 gaining stocks from 2024-03-08 to 2024-03-15"
        );
        assert_eq!(response.visualization.unwrap().kind, ChartKind::Ranking);
    }

    #[tokio::test]
    async fn test_top_losers() {
        let response = ask(&engine(), "which 2 stocks lost the most this week").await;
        assert_eq!(response.parsed.as_ref().unwrap().intent, Intent::TopLosers);
        let table = response.result.as_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0].to_string(), "WIPRO.NS");
        assert!(response.visualization.is_none());
    }

    #[tokio::test]
    async fn test_compare_in_catalog_order() {
        let response = ask(&engine(), "Compare TCS and RELIANCE performance this week").await;

        let parsed = response.parsed.as_ref().unwrap();
        assert_eq!(parsed.intent, Intent::CompareStocks);
        assert_eq!(parsed.symbols, vec!["TCS.NS", "RELIANCE.NS"]);
        assert_eq!(parsed.range.start, day("2024-03-11"));

        assert_eq!(response.result.row_count(), 10);
        assert_eq!(
            response.explanation,
            "Comparing performance of TCS.NS, RELIANCE.NS from 2024-03-11 to 2024-03-15"
        );
    }

    #[tokio::test]
    async fn test_compare_augments_single_symbol() {
        let engine = engine().with_chart_renderer(ChartDataRenderer);
        let response = ask(&engine, "compare tcs this week").await;

        let compared: Vec<String> = response
            .result
            .as_table()
            .unwrap()
            .column("Symbol")
            .iter()
            .map(ToString::to_string)
            .collect();
        let mut distinct = compared.clone();
        distinct.dedup();
        assert_eq!(distinct, vec!["TCS.NS", "RELIANCE.NS", "HDFCBANK.NS"]);
        assert!(response.explanation.contains("TCS.NS, RELIANCE.NS, HDFCBANK.NS"));

        let chart = response.visualization.unwrap();
        assert_eq!(chart.kind, ChartKind::Comparison);
        assert_eq!(chart.spec["series"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_compare_needs_two_symbols() {
        let response = ask(&engine(), "compare these").await;
        assert!(response.result.is_no_result());
        assert_eq!(response.explanation, NOT_ENOUGH_TO_COMPARE);

        // a single symbol with no shortlist to draw from
        let config = QueryConfig::builder()
            .popular_symbols(Vec::<String>::new())
            .build()
            .unwrap();
        let engine = QueryEngine::new(Arc::new(store()), config);
        let response = ask(&engine, "compare tcs").await;
        assert!(response.result.is_no_result());
    }

    #[tokio::test]
    async fn test_price_trend() {
        let response = ask(&engine(), "show me the price trend for infy last week").await;
        assert_eq!(response.parsed.as_ref().unwrap().intent, Intent::PriceTrend);
        assert_eq!(response.result.row_count(), 7);
        assert_eq!(
            response.explanation,
            "Showing price trend for INFY.NS from 2024-03-04 to 2024-03-10"
        );

        let response = ask(&engine(), "show me the price trend").await;
        assert_eq!(response.explanation, NO_SYMBOL);
    }

    #[tokio::test]
    async fn test_moving_average_windows_reset() {
        let response = ask(&engine(), "moving average 30 day short for tcs").await;
        assert_eq!(response.parsed.as_ref().unwrap().intent, Intent::MovingAverage);

        let table = response.result.as_table().unwrap();
        assert_eq!(table.columns, vec!["Date", "Close", "Volume", "MA_5", "MA_20"]);
        // 31 bars from 2024-02-14, first 19 lack a full long window
        assert_eq!(table.len(), 12);
        assert!(response.explanation.starts_with("Showing 5-day and 20-day moving averages for TCS.NS"));
    }

    #[tokio::test]
    async fn test_moving_average_insufficient() {
        let response = ask(&engine(), "moving average for tcs this week").await;
        assert!(response.result.is_no_result());
        assert_eq!(
            response.explanation,
            "Insufficient data to calculate moving averages for TCS.NS."
        );
    }

    #[tokio::test]
    async fn test_above_moving_average_screen() {
        let response = ask(&engine(), "top 3 stocks above their 10 day average").await;
        let parsed = response.parsed.as_ref().unwrap();
        assert_eq!(parsed.intent, Intent::MovingAverage);
        assert!(parsed.symbols.is_empty());

        let table = response.result.as_table().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns[2], "MA_10");
        assert!(!table.column("Symbol").iter().any(|c| c.to_string() == "WIPRO.NS"));
        assert_eq!(
            response.explanation,
            "Showing top 3 stocks trading above their 10-day moving average as of 2024-03-15"
        );

        let response = ask(&engine(), "moving average").await;
        assert!(response.explanation.contains("for moving average analysis"));
    }

    #[tokio::test]
    async fn test_volume_branches() {
        let response = ask(&engine(), "trading volume for tcs").await;
        assert_eq!(response.parsed.as_ref().unwrap().intent, Intent::VolumeAnalysis);
        assert_eq!(response.result.row_count(), 8);

        let engine = engine().with_chart_renderer(ChartDataRenderer);
        let response = ask(&engine, "which stocks had high volume").await;
        let table = response.result.as_table().unwrap();
        assert_eq!(table.columns, vec!["Symbol", "Volume"]);
        assert_eq!(table.len(), 5);
        assert_eq!(table.rows[0][0].to_string(), "WIPRO.NS");
        assert!(response.visualization.is_none());
    }

    #[tokio::test]
    async fn test_spikes() {
        let response = ask(&engine(), "any spikes in tcs this month").await;
        assert_eq!(response.parsed.as_ref().unwrap().intent, Intent::PriceSpike);
        let table = response.result.as_table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0][0].to_string(), "2024-03-13");
        assert_eq!(table.rows[0][5].to_string(), "price up");

        let response = ask(&engine(), "any spikes in infy this month").await;
        assert_eq!(
            response.explanation,
            "No significant price or volume spikes detected for INFY.NS in the specified period."
        );
    }

    #[tokio::test]
    async fn test_spikes_on_four_rows_is_insufficient() {
        let response = ask(&engine(), "spikes in tcs over the last 3 days").await;
        assert!(response.result.is_no_result());
        assert!(
            response
                .explanation
                .starts_with("Insufficient data to detect spikes for TCS.NS")
        );
    }

    #[tokio::test]
    async fn test_current_price() {
        let response = ask(&engine(), "What is the current price of TCS?").await;
        assert_eq!(
            response.result.as_text(),
            Some("The latest price of TCS.NS as of 2024-03-15 is ₹163.00")
        );
        assert_eq!(response.explanation, "Showing current price for TCS.NS");

        let response = ask(&engine(), "What is the current price of ITC?").await;
        assert!(response.result.is_no_result());
        assert_eq!(response.explanation, "No data available for ITC.NS on 2024-03-15.");
    }

    #[tokio::test]
    async fn test_general_info() {
        let response = ask(&engine(), "tell me about infy this week").await;
        let text = response.result.as_text().unwrap();
        assert!(text.starts_with("Symbol: INFY.NS"));
        assert!(text.contains("Period: 2024-03-11 to 2024-03-15"));

        let response = ask(&engine(), "give me an overview").await;
        let text = response.result.as_text().unwrap();
        assert!(text.starts_with("Market Summary for 2024-03-15"));
        assert!(text.contains("Total Stocks: 5"));
        assert!(text.contains("Losers: 1"));
        assert_eq!(response.explanation, "Showing market summary for 2024-03-15");
    }

    #[tokio::test]
    async fn test_collaborator_failure_is_no_result() {
        let mut mock = MockMarketData::new();
        mock.expect_list_catalog_symbols()
            .returning(|_| Err(QueryError::DataSource("connection refused".into())));

        let engine = QueryEngine::new(Arc::new(mock), QueryConfig::default());
        let response = ask(&engine, "Which stock gained the most today?").await;

        assert!(matches!(response.result, QueryResult::NoResult { .. }));
        assert_eq!(
            response.explanation,
            "An error occurred while processing your query: Data source error: connection refused"
        );
        assert!(response.parsed.is_none());
    }

    #[tokio::test]
    async fn test_inverted_range_is_clamped() {
        let parsed = engine()
            .parse("last month 3 days", day("2024-03-15"))
            .await
            .unwrap();
        assert!(parsed.range.is_ordered());
        assert_eq!(parsed.range.start, parsed.range.end);
    }
}
