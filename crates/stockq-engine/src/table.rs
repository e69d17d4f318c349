//! Tabular results

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{DATE_FORMAT, PriceBar};

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Date(NaiveDate),
    Integer(i64),
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Numeric view of the cell, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Missing
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("-"),
        }
    }
}

/// Ordered rows with named columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from typed rows
    pub fn from_rows<R: TableRow>(rows: &[R]) -> Self {
        let columns = rows
            .first()
            .map_or_else(R::default_columns, TableRow::columns);
        Self {
            columns,
            rows: rows.iter().map(TableRow::cells).collect(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column
    pub fn column(&self, name: &str) -> Vec<&Cell> {
        self.column_index(name)
            .map(|idx| self.rows.iter().filter_map(|row| row.get(idx)).collect())
            .unwrap_or_default()
    }
}

/// A typed row that can be rendered into a [`Table`]
pub trait TableRow {
    /// Column names used when there are no rows to inspect
    fn default_columns() -> Vec<String>;

    /// Column names for this row; differs from the defaults only for
    /// rows whose headers carry parameters (`MA_10`, `MA_20`, ...)
    fn columns(&self) -> Vec<String> {
        Self::default_columns()
    }

    fn cells(&self) -> Vec<Cell>;
}

pub(crate) fn names(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

impl TableRow for PriceBar {
    fn default_columns() -> Vec<String> {
        names(&["Date", "Open", "High", "Low", "Close", "Volume", "Symbol"])
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.date.into(),
            self.open.into(),
            self.high.into(),
            self.low.into(),
            self.close.into(),
            self.volume.into(),
            self.symbol.as_str().into(),
        ]
    }
}
