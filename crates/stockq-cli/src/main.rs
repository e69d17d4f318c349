//! stockq command-line interface
//!
//! Ask questions about a CSV data set of daily prices, either once or in an
//! interactive session.
//!
//! # Usage
//!
//! ```bash
//! # One question
//! stockq --data data/prices.csv "top 5 gainers this week"
//!
//! # Interactive session over a dated directory tree
//! stockq --data data/ --date 2024-03-15
//! ```

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table as TextTable};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use stockq_engine::format::{format_currency, format_percentage};
use stockq_engine::model::parse_date;
use stockq_engine::{
    CachedStore, Cell, ChartDataRenderer, CsvStore, MarketData, QueryConfig, QueryEngine,
    QueryResponse, QueryResult, Table,
};
use stockq_utils::{AppConfig, init_tracing_with};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stockq")]
#[command(about = "Ask questions about daily stock prices", long_about = None)]
struct Args {
    /// CSV file, or a directory of <YYYY-MM-DD>/<SYMBOL>.csv files
    #[arg(short, long)]
    data: PathBuf,

    /// Context date (YYYY-MM-DD); defaults to the latest date with data
    #[arg(long)]
    date: Option<String>,

    /// Print the whole response as JSON
    #[arg(long)]
    json: bool,

    /// Include chart data in responses
    #[arg(long)]
    chart: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Question to answer; omit to start an interactive session
    query: Option<String>,
}

const HELP: &str = r#"
Ask a question in plain English, for example:
  Which stock gained the most today?
  Compare TCS and RELIANCE performance this week
  Show 20-day moving average for INFY over the last 2 months
  What are the top 5 stocks trading above their 10-day average?
  Any price spikes in HDFCBANK this month?

Commands:
  /help   - show this help
  /exit   - leave
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing_with(&AppConfig::default().with_json_logs(args.log_json));

    let config = QueryConfig::default().with_env_overrides();
    config.validate()?;

    let store = CsvStore::open(&args.data)
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    let data: Arc<dyn MarketData> = Arc::new(CachedStore::new(Arc::new(store), config.cache_ttl));

    let context_date = resolve_context_date(args.date.as_deref(), data.as_ref()).await?;
    info!("Using context date {}", context_date);

    let mut engine = QueryEngine::new(data, config);
    if args.chart {
        engine = engine.with_chart_renderer(ChartDataRenderer);
    }

    match args.query {
        Some(query) => {
            let response = engine.process_query(&query, context_date).await;
            print_response(&response, args.json, &engine.config().currency_symbol)?;
        }
        None => repl(&engine, context_date, args.json).await?,
    }

    Ok(())
}

async fn resolve_context_date(
    date: Option<&str>,
    data: &dyn MarketData,
) -> anyhow::Result<NaiveDate> {
    if let Some(date) = date {
        return Ok(parse_date(date)?);
    }
    match data.list_available_dates().await?.last() {
        Some(latest) => Ok(*latest),
        None => bail!("the data set has no trading days"),
    }
}

async fn repl(engine: &QueryEngine, context_date: NaiveDate, json: bool) -> anyhow::Result<()> {
    println!("stockq - data as of {context_date}. Type /help for examples, /exit to leave.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        match stdin.lock().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                continue;
            }
        }

        match input.trim() {
            "" => {}
            "/exit" | "/quit" => {
                println!("Goodbye!");
                break;
            }
            "/help" => println!("{HELP}"),
            command if command.starts_with('/') => {
                eprintln!("Unknown command: {command}. Type /help for help.\n");
            }
            query => {
                let response = engine.process_query(query, context_date).await;
                print_response(&response, json, &engine.config().currency_symbol)?;
                println!();
            }
        }
    }

    Ok(())
}

fn print_response(response: &QueryResponse, json: bool, currency: &str) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    println!("{}", response.explanation);
    match &response.result {
        QueryResult::Table(table) if table.is_empty() => println!("(no rows)"),
        QueryResult::Table(table) => println!("{}", render_table(table, currency)),
        QueryResult::Text(text) => println!("{text}"),
        QueryResult::NoResult { .. } => {}
    }

    if let Some(chart) = &response.visualization {
        println!("\nChart: {}", chart.title);
        println!("{}", serde_json::to_string_pretty(&chart.spec)?);
    }
    Ok(())
}

const PRICE_COLUMNS: &[&str] = &[
    "Open",
    "High",
    "Low",
    "Close",
    "Previous",
    "Start_Price",
    "End_Price",
];

#[derive(Clone, Copy)]
enum ColumnStyle {
    Plain,
    Price,
    Percent,
}

fn render_table(table: &Table, currency: &str) -> TextTable {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(table.columns.clone());

    let styles: Vec<ColumnStyle> = table
        .columns
        .iter()
        .map(|c| {
            if c.ends_with("(%)") {
                ColumnStyle::Percent
            } else if PRICE_COLUMNS.contains(&c.as_str()) || c.starts_with("MA_") {
                ColumnStyle::Price
            } else {
                ColumnStyle::Plain
            }
        })
        .collect();

    for row in &table.rows {
        out.add_row(row.iter().zip(&styles).map(|(cell, style)| match (style, cell) {
            (ColumnStyle::Percent, Cell::Number(value)) => format_percentage(*value),
            (ColumnStyle::Price, Cell::Number(value)) => format_currency(*value, currency),
            _ => cell.to_string(),
        }));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["stockq", "--data", "prices.csv", "top 5 gainers"]).unwrap();
        assert_eq!(args.data, PathBuf::from("prices.csv"));
        assert_eq!(args.query.as_deref(), Some("top 5 gainers"));
        assert!(!args.json);

        let args = Args::try_parse_from(["stockq", "-d", "data", "--date", "2024-03-15", "--json"]).unwrap();
        assert!(args.query.is_none());
        assert!(args.json);

        assert!(Args::try_parse_from(["stockq"]).is_err());
    }

    #[test]
    fn test_render_table_formats_columns() {
        let mut table = Table::new(vec![
            "Symbol".to_string(),
            "End_Price".to_string(),
            "Return (%)".to_string(),
        ]);
        table.push(vec![Cell::from("TCS.NS"), Cell::from(3900.5), Cell::from(12.345)]);

        let rendered = render_table(&table, "₹").to_string();
        assert!(rendered.contains("TCS.NS"));
        assert!(rendered.contains("₹3900.50"));
        assert!(rendered.contains("+12.35%"));
    }

    #[tokio::test]
    async fn test_context_date_defaults_to_latest() {
        let date = parse_date("2024-03-15").unwrap();
        let store = stockq_engine::MemoryStore::from_bars(vec![
            stockq_engine::PriceBar::flat("TCS.NS", parse_date("2024-03-14").unwrap(), 1.0, 1),
            stockq_engine::PriceBar::flat("TCS.NS", date, 1.0, 1),
        ]);
        assert_eq!(resolve_context_date(None, &store).await.unwrap(), date);

        let explicit = resolve_context_date(Some("2024-03-01"), &store).await.unwrap();
        assert_eq!(explicit, parse_date("2024-03-01").unwrap());

        let empty = stockq_engine::MemoryStore::new();
        assert!(resolve_context_date(None, &empty).await.is_err());
    }
}
