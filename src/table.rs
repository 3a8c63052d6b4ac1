//! Parsing of the wrapped visualization-API response into a typed [`Table`].
//!
//! The upstream endpoint answers with JavaScript rather than bare JSON:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"status":"ok","table":{...}});
//! ```
//!
//! [`parse_response`] strips that envelope, surfaces API-level errors and
//! resolves every cell to a [`Cell`].

use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;

static ENVELOPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*\((.*)\);?\s*$")
        .expect("valid envelope regex")
});

static PSEUDO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Date\((-?\d+),(\d+),(\d+)").expect("valid pseudo-date regex")
});

const API_ERROR_FALLBACK: &str = "API Error";

/// A `Date(year,month,day)` token as emitted by the spreadsheet for date cells
/// without a formatted representation. `month` is 0-based, like the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PseudoDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PseudoDate {
    /// Parses the leading `Date(y,m,d` part of a token. Trailing time
    /// components (`Date(2024,0,1,12,0,0)`) are ignored.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = PSEUDO_DATE_RE.captures(token.trim())?;
        Some(Self {
            year: caps[1].parse().ok()?,
            month: caps[2].parse().ok()?,
            day: caps[3].parse().ok()?,
        })
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month + 1, self.day)
    }
}

impl fmt::Display for PseudoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({},{},{})", self.year, self.month, self.day)
    }
}

/// One resolved spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Raw pseudo-date token that came without a formatted string.
    Date(PseudoDate),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Mirrors the spreadsheet notion of an "empty" cell: null, blank text,
    /// zero or `false`.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Number(n) => *n == 0.0 || n.is_nan(),
            Cell::Text(s) => s.is_empty(),
            Cell::Bool(b) => !b,
            Cell::Date(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric coercion used for amounts and apartment numbers. Text is
    /// trimmed and thousands separators are dropped; blank or unparsable text
    /// yields `None`.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Display text of the cell; integral numbers print without a fraction.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Number(n) => format_number(*n),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Value::Null,
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Date(d) => Value::String(d.to_string()),
        }
    }
}

/// Column labels plus rows of cells. Every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Index of the first column whose label equals `label`, ignoring case.
    pub fn find_column(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.to_lowercase() == label.to_lowercase())
    }
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<RawApiError>,
    #[serde(default)]
    table: Option<RawTable>,
}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawTable {
    #[serde(default)]
    cols: Vec<RawColumn>,
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Deserialize)]
struct RawColumn {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Deserialize)]
struct RawRow {
    #[serde(default)]
    c: Vec<Option<RawCell>>,
}

#[derive(Deserialize)]
struct RawCell {
    #[serde(default)]
    v: Option<Value>,
    #[serde(default)]
    f: Option<String>,
}

impl RawColumn {
    fn display_label(self) -> String {
        match self.label {
            Some(label) if !label.is_empty() => label,
            _ => self.id.unwrap_or_default(),
        }
    }
}

impl RawCell {
    /// Formatted text wins over a raw `Date(...)` token; otherwise the raw
    /// value wins and the formatted text is only a fallback.
    fn resolve(self) -> Cell {
        let formatted = self.f.filter(|f| !f.is_empty());

        match self.v {
            Some(Value::String(raw)) if raw.starts_with("Date(") => match formatted {
                Some(f) => Cell::Text(f),
                None => PseudoDate::parse(&raw)
                    .map(Cell::Date)
                    .unwrap_or(Cell::Text(raw)),
            },
            Some(Value::Null) | None => formatted.map(Cell::Text).unwrap_or(Cell::Null),
            Some(Value::Number(n)) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Some(Value::String(s)) => Cell::Text(s),
            Some(Value::Bool(b)) => Cell::Bool(b),
            Some(other) => Cell::Text(other.to_string()),
        }
    }
}

/// Extracts the JSON payload from its call-expression envelope and resolves
/// it into a [`Table`].
pub fn parse_response(response: &str) -> Result<Table> {
    let caps = ENVELOPE_RE.captures(response).ok_or(LedgerError::Format)?;
    let payload: RawResponse = serde_json::from_str(&caps[1])?;

    if payload.status.as_deref() == Some("error") {
        let message = payload
            .errors
            .into_iter()
            .next()
            .and_then(|e| e.message)
            .unwrap_or_else(|| API_ERROR_FALLBACK.to_string());
        return Err(LedgerError::Api(message));
    }

    let raw = payload.table.unwrap_or_default();
    let columns: Vec<String> = raw.cols.into_iter().map(RawColumn::display_label).collect();
    let rows: Vec<Vec<Cell>> = raw
        .rows
        .into_iter()
        .map(|row| {
            row.c
                .into_iter()
                .map(|cell| cell.map(RawCell::resolve).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    debug!(
        "Parsed table with {} columns and {} rows",
        columns.len(),
        rows.len()
    );

    Ok(Table::new(columns, rows))
}
