//! Projections from a parsed [`Table`] into domain records, one per sheet.
//!
//! Each projection is a pure function of its table (plus, for payments, the
//! month resolver and the reference date). Rows that cannot be placed are
//! skipped; no projection fails.

use crate::ledger::LedgerBuilder;
use crate::month::MonthResolver;
use crate::schema::{Expense, Floor, PaymentsSheet, ResidentDirectory, ResidentInfo};
use crate::table::{Cell, Table};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};

const YEAR_COLUMN: &str = "year";

/// Builds the payment ledger.
///
/// Column 0 holds the period, resident columns follow, and an optional
/// `year` column closes the resident range. Without a year column every row
/// is attributed to `today`'s year.
pub fn normalize_payments(
    table: &Table,
    resolver: &MonthResolver,
    today: NaiveDate,
) -> PaymentsSheet {
    let year_col = table.find_column(YEAR_COLUMN).filter(|&idx| idx > 0);
    let resident_end = year_col.unwrap_or(table.columns.len());

    let resident_cols: Vec<(usize, String)> = table
        .columns
        .iter()
        .enumerate()
        .take(resident_end)
        .skip(1)
        .filter(|(_, label)| !label.trim().is_empty())
        .map(|(idx, label)| (idx, label.clone()))
        .collect();

    let mut builder =
        LedgerBuilder::new(resident_cols.iter().map(|(_, name)| name.clone()).collect());

    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(month) = row.first().and_then(|period| resolver.resolve(period)) else {
            continue;
        };

        let year = match year_col {
            Some(col) => match coerce_year(row.get(col)) {
                Some(year) => year,
                None => {
                    debug!("Skipping payments row {}: no year", row_idx);
                    continue;
                }
            },
            None => today.year(),
        };

        builder.add_year(year);

        for (col, name) in &resident_cols {
            builder.record(name, year, month, row.get(*col).and_then(Cell::to_number));
        }
    }

    let sheet = builder.finish();
    debug!(
        "Normalized payments: {} residents, years {:?}",
        sheet.residents.len(),
        sheet.years
    );
    sheet
}

/// Short rows in a hand-built [`Table`] read as null cells.
fn coerce_year(cell: Option<&Cell>) -> Option<i32> {
    let cell = cell.filter(|cell| !cell.is_blank())?;
    let year = match cell {
        Cell::Number(n) if n.is_finite() => Some(n.trunc() as i32),
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| n.trunc() as i32),
        Cell::Date(date) => Some(date.year),
        _ => None,
    };
    if year.is_none() {
        warn!("Ignoring unparsable year cell {:?}", cell);
    }
    year.filter(|y| *y != 0)
}

/// The first numeric cell in reading order, or 0.
pub fn normalize_total(table: &Table) -> f64 {
    table
        .rows
        .iter()
        .flatten()
        .find_map(Cell::as_number)
        .unwrap_or(0.0)
}

/// Columns: type, amount, receipt, notes. Rows without a type are dropped and
/// the remainder is reversed so the latest entry comes first.
pub fn normalize_expenses(table: &Table) -> Vec<Expense> {
    let mut expenses: Vec<Expense> = table
        .rows
        .iter()
        .map(|row| Expense {
            expense_type: text_or_empty(row.first()),
            price: row.get(1).and_then(Cell::to_number).unwrap_or(0.0),
            receipt: text_or_empty(row.get(2)),
            notes: text_or_empty(row.get(3)),
        })
        .filter(|expense| !expense.expense_type.is_empty())
        .collect();
    expenses.reverse();

    debug!("Normalized {} expenses", expenses.len());
    expenses
}

/// Columns: family name, first name, property owner. Keyed by family name,
/// or first name when the family name is blank.
pub fn normalize_residents(table: &Table) -> ResidentDirectory {
    let mut directory = ResidentDirectory::new();

    for row in &table.rows {
        let mut info = ResidentInfo {
            family_name: trimmed_text(row.first()),
            first_name: trimmed_text(row.get(1)),
            property_owner: trimmed_text(row.get(2)),
            display_name: String::new(),
        };

        let key = info.join_key().to_string();
        if key.is_empty() {
            continue;
        }
        info.display_name = key.clone();
        directory.insert(key, info);
    }

    debug!("Normalized {} residents", directory.len());
    directory
}

/// One row per floor, listed top to bottom; the last row is floor 0.
pub fn normalize_building(table: &Table) -> Vec<Floor> {
    let row_count = table.rows.len();

    let floors: Vec<Floor> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let apartments: Vec<u32> = row
                .iter()
                .filter(|cell| !cell.is_null())
                .filter_map(apartment_number)
                .collect();

            (!apartments.is_empty()).then(|| Floor {
                number: row_count - idx - 1,
                apartments,
            })
        })
        .collect();

    debug!("Normalized building with {} floors", floors.len());
    floors
}

fn apartment_number(cell: &Cell) -> Option<u32> {
    match cell.to_number() {
        Some(n) if n >= 0.0 && n <= u32::MAX as f64 => Some(n as u32),
        _ => {
            warn!("Ignoring non-numeric apartment cell {:?}", cell);
            None
        }
    }
}

fn text_or_empty(cell: Option<&Cell>) -> String {
    match cell {
        Some(cell) if !cell.is_blank() => cell.to_text(),
        _ => String::new(),
    }
}

fn trimmed_text(cell: Option<&Cell>) -> String {
    text_or_empty(cell).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PaymentEntry;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn cols(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_payments_with_year_column() {
        let table = Table::new(
            cols(&["Month", "Cohen", "", "Levi", "Year"]),
            vec![
                vec![
                    text("Date(2024,0,1)"),
                    Cell::Number(50.0),
                    text("ignored"),
                    Cell::Null,
                    Cell::Number(2024.0),
                ],
                vec![
                    text("דצמ 2023"),
                    Cell::Number(0.0),
                    Cell::Null,
                    text("25"),
                    text("2023"),
                ],
                vec![Cell::Null, Cell::Number(50.0), Cell::Null, Cell::Null, Cell::Number(2022.0)],
                vec![text("פבר"), Cell::Number(50.0), Cell::Null, Cell::Null, Cell::Null],
            ],
        );

        let sheet = normalize_payments(&table, &MonthResolver::default(), today());

        assert_eq!(sheet.residents, vec!["Cohen", "Levi"]);
        assert_eq!(sheet.years, vec![2024, 2023]);

        let cohen = &sheet.payments["Cohen"];
        assert_eq!(
            cohen[&2024][0],
            Some(PaymentEntry {
                month: 0,
                amount: Some(50.0)
            })
        );
        assert_eq!(cohen[&2023][11].unwrap().amount, Some(0.0));

        let levi = &sheet.payments["Levi"];
        assert_eq!(levi[&2024][0].unwrap().amount, None);
        assert_eq!(levi[&2023][11].unwrap().amount, Some(25.0));
        assert!(!levi.contains_key(&2022));
    }

    #[test]
    fn test_payments_without_year_column_use_reference_year() {
        let table = Table::new(
            cols(&["Month", "Cohen"]),
            vec![vec![text("מרץ"), Cell::Number(50.0)]],
        );
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.years, vec![2024]);
        assert_eq!(sheet.payments["Cohen"][&2024][2].unwrap().amount, Some(50.0));
    }

    #[test]
    fn test_year_column_label_is_case_insensitive() {
        let table = Table::new(
            cols(&["Month", "Cohen", "YEAR"]),
            vec![vec![text("ינו"), Cell::Number(50.0), Cell::Number(2021.0)]],
        );
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.residents, vec!["Cohen"]);
        assert_eq!(sheet.years, vec![2021]);
    }

    #[test]
    fn test_year_column_at_index_zero_is_ignored() {
        let table = Table::new(
            cols(&["year", "Cohen"]),
            vec![vec![text("פבר"), Cell::Number(50.0)]],
        );
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.residents, vec!["Cohen"]);
        assert_eq!(sheet.years, vec![2024]);
        assert_eq!(sheet.payments["Cohen"][&2024][1].unwrap().amount, Some(50.0));
    }

    #[test]
    fn test_unparsable_year_skips_row() {
        let table = Table::new(
            cols(&["Month", "Cohen", "Year"]),
            vec![
                vec![text("ינו"), Cell::Number(50.0), text("last year")],
                vec![text("פבר"), Cell::Number(50.0), Cell::Number(2023.0)],
            ],
        );
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.years, vec![2023]);
        let cohen = &sheet.payments["Cohen"][&2023];
        assert_eq!(cohen[0], None);
        assert_eq!(cohen[1].unwrap().amount, Some(50.0));
    }

    #[test]
    fn test_short_rows_read_as_null() {
        let table = Table {
            columns: cols(&["Month", "Cohen", "year"]),
            rows: vec![
                vec![text("ינו")],
                vec![text("פבר"), Cell::Number(50.0)],
                vec![text("מרץ"), Cell::Number(40.0), Cell::Number(2024.0)],
            ],
        };
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.years, vec![2024]);
        let cohen = &sheet.payments["Cohen"][&2024];
        assert_eq!(cohen[0], None);
        assert_eq!(cohen[1], None);
        assert_eq!(cohen[2].unwrap().amount, Some(40.0));
    }

    #[test]
    fn test_short_rows_without_year_column() {
        let table = Table {
            columns: cols(&["Month", "Cohen", "Levi"]),
            rows: vec![vec![text("ינו"), Cell::Number(50.0)]],
        };
        let sheet = normalize_payments(&table, &MonthResolver::default(), today());
        assert_eq!(sheet.payments["Cohen"][&2024][0].unwrap().amount, Some(50.0));
        assert_eq!(sheet.payments["Levi"][&2024][0].unwrap().amount, None);
    }

    #[test]
    fn test_total_takes_first_number() {
        let table = Table::new(
            cols(&["A", "B"]),
            vec![
                vec![text("Fund"), Cell::Null],
                vec![text("1,000"), Cell::Number(12_345.5)],
                vec![Cell::Number(1.0), Cell::Null],
            ],
        );
        assert_eq!(normalize_total(&table), 12_345.5);
        assert_eq!(normalize_total(&Table::default()), 0.0);
    }

    #[test]
    fn test_expenses_drop_untyped_and_reverse() {
        let table = Table::new(
            cols(&["Type", "Amount", "Receipt", "Notes"]),
            vec![
                vec![text("A"), Cell::Number(100.0)],
                vec![text(""), Cell::Number(5.0)],
                vec![text("B"), Cell::Null, text("https://x"), text("late")],
            ],
        );
        let expenses = normalize_expenses(&table);
        let types: Vec<&str> = expenses.iter().map(|e| e.expense_type.as_str()).collect();
        assert_eq!(types, vec!["B", "A"]);
        assert_eq!(expenses[0].price, 0.0);
        assert_eq!(expenses[0].notes, "late");
        assert_eq!(expenses[1].price, 100.0);
        assert_eq!(expenses[1].receipt, "");
    }

    #[test]
    fn test_residents_keyed_by_family_then_first_name() {
        let table = Table::new(
            cols(&["Family", "First", "Owner"]),
            vec![
                vec![text(" Cohen "), text("Avi"), text("yes")],
                vec![Cell::Null, text("Dana"), Cell::Null],
                vec![Cell::Null, text("  "), text("orphan")],
            ],
        );
        let directory = normalize_residents(&table);
        assert_eq!(directory.len(), 2);
        assert_eq!(directory["Cohen"].first_name, "Avi");
        assert_eq!(directory["Cohen"].property_owner, "yes");
        assert_eq!(directory["Dana"].display_name, "Dana");
        assert_eq!(directory["Dana"].family_name, "");
    }

    #[test]
    fn test_building_floor_numbers_count_up_from_last_row() {
        let table = Table::new(
            cols(&["A", "B"]),
            vec![
                vec![Cell::Number(1.0), Cell::Number(2.0)],
                vec![Cell::Number(3.0), text("4")],
                vec![Cell::Number(5.0), Cell::Null],
            ],
        );
        let floors = normalize_building(&table);
        let numbers: Vec<usize> = floors.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![2, 1, 0]);
        assert_eq!(floors[1].apartments, vec![3, 4]);
        assert_eq!(floors[2].apartments, vec![5]);
    }

    #[test]
    fn test_building_skips_empty_rows_but_keeps_numbering() {
        let table = Table::new(
            cols(&["A"]),
            vec![vec![Cell::Number(9.0)], vec![Cell::Null], vec![Cell::Number(1.0)]],
        );
        let floors = normalize_building(&table);
        assert_eq!(
            floors,
            vec![
                Floor {
                    number: 2,
                    apartments: vec![9]
                },
                Floor {
                    number: 0,
                    apartments: vec![1]
                },
            ]
        );
    }
}
