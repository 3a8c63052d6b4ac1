use crate::error::{LedgerError, Result};
use crate::table::{Cell, PseudoDate};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Date\(\d+,(\d+),\d+[,)]").expect("valid month token regex"));

/// Hebrew month abbreviations in calendar order, as they appear in the
/// formatted period column of the payments sheet.
pub const HEBREW_MONTH_ABBREVIATIONS: [&str; 12] = [
    "ינו", "פבר", "מרץ", "אפר", "מאי", "יונ", "יול", "אוג", "ספט", "אוק", "נוב", "דצמ",
];

/// Maps a period cell to a 0-based month index.
#[derive(Debug, Clone)]
pub struct MonthResolver {
    abbreviations: Vec<String>,
}

impl Default for MonthResolver {
    fn default() -> Self {
        Self {
            abbreviations: HEBREW_MONTH_ABBREVIATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl MonthResolver {
    pub fn new(abbreviations: &[String]) -> Result<Self> {
        validate_abbreviations(abbreviations)?;
        Ok(Self {
            abbreviations: abbreviations.to_vec(),
        })
    }

    /// Returns `None` for an empty cell, which the caller skips.
    ///
    /// Resolution order:
    /// 1. text containing a `Date(y,m,d)` token yields the embedded month;
    /// 2. other text yields the first abbreviation it contains, else 0;
    /// 3. a structured date yields its own month.
    ///
    /// Non-zero numbers carry no month information and resolve to 0.
    pub fn resolve(&self, cell: &Cell) -> Option<usize> {
        if cell.is_blank() {
            return None;
        }

        let index = match cell {
            Cell::Text(text) => self.resolve_text(text),
            Cell::Date(date) => resolve_date(date),
            _ => 0,
        };
        Some(index)
    }

    fn resolve_text(&self, text: &str) -> usize {
        if let Some(month) = MONTH_TOKEN_RE
            .captures(text)
            .and_then(|caps| caps[1].parse::<usize>().ok())
        {
            return month.min(11);
        }

        self.abbreviations
            .iter()
            .position(|abbr| text.contains(abbr.as_str()))
            .unwrap_or(0)
    }
}

fn resolve_date(date: &PseudoDate) -> usize {
    (date.month as usize).min(11)
}

pub fn validate_abbreviations(abbreviations: &[String]) -> Result<()> {
    if abbreviations.len() != 12 {
        return Err(LedgerError::InvalidConfig(format!(
            "Expected 12 month abbreviations, got {}",
            abbreviations.len()
        )));
    }

    if let Some(idx) = abbreviations.iter().position(|a| a.trim().is_empty()) {
        return Err(LedgerError::InvalidConfig(format!(
            "Month abbreviation #{} is empty",
            idx
        )));
    }

    Ok(())
}
