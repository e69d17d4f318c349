//! Chart-ready data for query results
//!
//! The engine describes what it wants drawn as a [`ChartRequest`]; a
//! [`ChartRenderer`] turns that into a [`Visualization`]. The default
//! [`ChartDataRenderer`] emits plain JSON series a front end can plot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::analysis::{MovingAverageRow, RankOrder, VolumeRow};
use crate::format::clean_symbol;
use crate::model::{DateRange, PriceBar};

/// Kind of chart a [`Visualization`] holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Price,
    Comparison,
    MovingAverages,
    Volume,
    Ranking,
}

/// A rendered chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub kind: ChartKind,
    pub title: String,
    pub spec: Value,
}

/// What to draw, with the data already loaded
#[derive(Debug, Clone)]
pub enum ChartRequest<'a> {
    /// Candlesticks and volume bars, with optional highlighted days
    Price {
        symbol: &'a str,
        range: DateRange,
        bars: &'a [PriceBar],
        highlights: &'a [NaiveDate],
    },
    /// Several symbols as % change from their first close
    Comparison {
        range: DateRange,
        series: &'a [(String, Vec<PriceBar>)],
    },
    MovingAverages {
        symbol: &'a str,
        rows: &'a [MovingAverageRow],
    },
    Volume {
        symbol: &'a str,
        rows: &'a [VolumeRow],
    },
    /// Bar chart of one metric per symbol
    Ranking {
        metric: &'a str,
        order: RankOrder,
        points: Vec<(String, f64)>,
    },
}

/// Turns chart requests into visualizations
pub trait ChartRenderer: Send + Sync {
    /// `None` when the request has nothing to draw
    fn render(&self, request: &ChartRequest<'_>) -> Option<Visualization>;
}

/// Renders chart requests to JSON series
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartDataRenderer;

impl ChartRenderer for ChartDataRenderer {
    fn render(&self, request: &ChartRequest<'_>) -> Option<Visualization> {
        match request {
            ChartRequest::Price {
                symbol,
                range,
                bars,
                highlights,
            } => price_chart(symbol, *range, bars, highlights),
            ChartRequest::Comparison { range, series } => comparison_chart(*range, series),
            ChartRequest::MovingAverages { symbol, rows } => moving_average_chart(symbol, rows),
            ChartRequest::Volume { symbol, rows } => volume_chart(symbol, rows),
            ChartRequest::Ranking {
                metric,
                order,
                points,
            } => ranking_chart(metric, *order, points),
        }
    }
}

fn price_chart(
    symbol: &str,
    range: DateRange,
    bars: &[PriceBar],
    highlights: &[NaiveDate],
) -> Option<Visualization> {
    if bars.is_empty() {
        return None;
    }

    let candlestick: Vec<_> = bars
        .iter()
        .map(|b| {
            json!({
                "date": b.date,
                "open": b.open,
                "high": b.high,
                "low": b.low,
                "close": b.close,
            })
        })
        .collect();
    let volume: Vec<_> = bars
        .iter()
        .map(|b| json!({"date": b.date, "value": b.volume}))
        .collect();
    let markers: Vec<_> = bars
        .iter()
        .filter(|b| highlights.contains(&b.date))
        .map(|b| json!({"date": b.date, "value": b.close}))
        .collect();

    let label = clean_symbol(symbol);
    Some(Visualization {
        kind: ChartKind::Price,
        title: format!("{label} Stock Price ({range})"),
        spec: json!({
            "symbol": label,
            "data_points": bars.len(),
            "candlestick": candlestick,
            "volume": volume,
            "markers": markers,
            "chart_metadata": {
                "start_date": range.start,
                "end_date": range.end,
                "min_price": bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
                "max_price": bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
                "x_axis": "Date",
                "y_axis": "Price",
            }
        }),
    })
}

fn comparison_chart(range: DateRange, series: &[(String, Vec<PriceBar>)]) -> Option<Visualization> {
    let lines: Vec<_> = series
        .iter()
        .filter_map(|(symbol, bars)| {
            let base = bars.first()?.close;
            if base == 0.0 {
                return None;
            }
            let points: Vec<_> = bars
                .iter()
                .map(|b| json!({"date": b.date, "value": (b.close / base - 1.0) * 100.0}))
                .collect();
            Some(json!({"name": clean_symbol(symbol), "line": points}))
        })
        .collect();
    if lines.is_empty() {
        return None;
    }

    Some(Visualization {
        kind: ChartKind::Comparison,
        title: format!("Stock Performance Comparison (% Change) ({range})"),
        spec: json!({
            "series": lines,
            "chart_metadata": {
                "start_date": range.start,
                "end_date": range.end,
                "x_axis": "Date",
                "y_axis": "% Change",
            }
        }),
    })
}

fn moving_average_chart(symbol: &str, rows: &[MovingAverageRow]) -> Option<Visualization> {
    let first = rows.first()?;
    let (short, long) = (first.windows.short(), first.windows.long());
    let line = |value: fn(&MovingAverageRow) -> f64| -> Vec<Value> {
        rows.iter()
            .map(|r| json!({"date": r.date, "value": value(r)}))
            .collect()
    };

    let mut indicators = Map::new();
    indicators.insert(format!("MA_{short}"), Value::from(line(|r| r.short_ma)));
    indicators.insert(format!("MA_{long}"), Value::from(line(|r| r.long_ma)));

    let label = clean_symbol(symbol);
    Some(Visualization {
        kind: ChartKind::MovingAverages,
        title: format!("{label} with {short}-day and {long}-day Moving Averages"),
        spec: json!({
            "symbol": label,
            "close": line(|r| r.close),
            "indicators": indicators,
            "volume": line(|r| r.volume as f64),
        }),
    })
}

fn volume_chart(symbol: &str, rows: &[VolumeRow]) -> Option<Visualization> {
    if rows.is_empty() {
        return None;
    }
    let close: Vec<_> = rows
        .iter()
        .map(|r| json!({"date": r.date, "value": r.close}))
        .collect();
    let volume: Vec<_> = rows
        .iter()
        .map(|r| json!({"date": r.date, "value": r.volume}))
        .collect();
    let volume_ma: Vec<_> = rows
        .iter()
        .filter_map(|r| Some(json!({"date": r.date, "value": r.volume_ma?})))
        .collect();

    let label = clean_symbol(symbol);
    Some(Visualization {
        kind: ChartKind::Volume,
        title: format!("{label} Volume Analysis"),
        spec: json!({
            "symbol": label,
            "close": close,
            "volume": volume,
            "volume_ma_5": volume_ma,
            "correlation": rows.first().and_then(|r| r.volume_price_corr),
        }),
    })
}

fn ranking_chart(metric: &str, order: RankOrder, points: &[(String, f64)]) -> Option<Visualization> {
    if points.is_empty() {
        return None;
    }
    let edge = match order {
        RankOrder::Best => "Top",
        RankOrder::Worst => "Bottom",
    };
    let bars: Vec<_> = points
        .iter()
        .map(|(symbol, value)| json!({"label": clean_symbol(symbol), "value": value}))
        .collect();

    Some(Visualization {
        kind: ChartKind::Ranking,
        title: format!("{edge} {} Stocks by {metric}", points.len()),
        spec: json!({
            "metric": metric,
            "bars": bars,
            "chart_metadata": {
                "x_axis": "Stock Symbol",
                "y_axis": metric,
            }
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{MaWindows, moving_averages};
    use crate::model::parse_date;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn bars() -> Vec<PriceBar> {
        vec![
            PriceBar::flat("TCS.NS", day("2024-03-14"), 100.0, 10),
            PriceBar::flat("TCS.NS", day("2024-03-15"), 110.0, 20),
        ]
    }

    #[test]
    fn test_price_chart() {
        let range = DateRange::new(day("2024-03-08"), day("2024-03-15"));
        let bars = bars();
        let highlights = [day("2024-03-15")];
        let chart = ChartDataRenderer
            .render(&ChartRequest::Price {
                symbol: "TCS.NS",
                range,
                bars: &bars,
                highlights: &highlights,
            })
            .unwrap();

        assert_eq!(chart.kind, ChartKind::Price);
        assert_eq!(chart.title, "TCS Stock Price (2024-03-08 to 2024-03-15)");
        assert_eq!(chart.spec["data_points"], 2);
        assert_eq!(chart.spec["markers"].as_array().unwrap().len(), 1);
        assert_eq!(chart.spec["candlestick"][0]["date"], "2024-03-14");
    }

    #[test]
    fn test_comparison_is_normalized() {
        let range = DateRange::new(day("2024-03-08"), day("2024-03-15"));
        let series = vec![("TCS.NS".to_string(), bars()), ("EMPTY.NS".to_string(), Vec::new())];
        let chart = ChartDataRenderer
            .render(&ChartRequest::Comparison {
                range,
                series: &series,
            })
            .unwrap();

        let lines = chart.spec["series"].as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["name"], "TCS");
        let last = lines[0]["line"][1]["value"].as_f64().unwrap();
        assert!((last - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_moving_average_chart() {
        let bars: Vec<_> = (0..5u64)
            .map(|i| {
                let date = day("2024-03-01") + chrono::Days::new(i);
                PriceBar::flat("TCS.NS", date, 100.0 + i as f64, 10)
            })
            .collect();
        let rows = moving_averages("TCS.NS", &bars, MaWindows::new(2, 3, (5, 20))).unwrap();
        let chart = ChartDataRenderer
            .render(&ChartRequest::MovingAverages {
                symbol: "TCS.NS",
                rows: &rows,
            })
            .unwrap();
        assert_eq!(chart.title, "TCS with 2-day and 3-day Moving Averages");
        assert_eq!(chart.spec["indicators"]["MA_3"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_ranking_titles() {
        let points = vec![("A.NS".to_string(), 3.0), ("B.NS".to_string(), 1.0)];
        let best = ChartDataRenderer
            .render(&ChartRequest::Ranking {
                metric: "Return (%)",
                order: RankOrder::Best,
                points: points.clone(),
            })
            .unwrap();
        assert_eq!(best.title, "Top 2 Stocks by Return (%)");
        assert_eq!(best.spec["bars"][0]["label"], "A");

        let worst = ChartDataRenderer
            .render(&ChartRequest::Ranking {
                metric: "Return (%)",
                order: RankOrder::Worst,
                points,
            })
            .unwrap();
        assert!(worst.title.starts_with("Bottom 2"));
    }

    #[test]
    fn test_nothing_to_draw() {
        let chart = ChartDataRenderer.render(&ChartRequest::Volume {
            symbol: "TCS.NS",
            rows: &[],
        });
        assert!(chart.is_none());
    }
}
