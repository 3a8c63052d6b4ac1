//! # Building Fund Ledger
//!
//! A library for turning the sheets of a building's maintenance-fund
//! spreadsheet into a normalized payment ledger and per-resident debt reports.
//!
//! ## Core Concepts
//!
//! - **Envelope**: sheets are exported as `setResponse({...});` JavaScript; [`parse_response`]
//!   extracts the JSON table inside it
//! - **Period cells**: the month of a payments row may arrive as a `Date(y,m,d)` token, as
//!   formatted text with a localized month abbreviation, or as a structured date
//! - **Ledger**: resident × year × month grid of [`PaymentEntry`] values
//! - **Accrual**: every month up to the current one owes a fixed due, minus what was paid;
//!   the previous year is always counted in full
//!
//! ## Example
//!
//! ```rust,ignore
//! use building_fund_ledger::*;
//! use chrono::NaiveDate;
//!
//! let table = parse_response(&raw_payments_text)?;
//! let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let sheet = normalize_payments(&table, &MonthResolver::default(), today);
//!
//! let owed = compute_owed(sheet.resident_payments("Cohen"), 2024, 2, 50.0);
//! println!("owes {} this year, {} from last year", owed.owed_current, owed.owed_prior);
//! ```

pub mod accrual;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod ledger;
pub mod month;
pub mod schema;
pub mod service;
pub mod table;
pub mod utils;

#[cfg(feature = "gviz")]
pub mod gviz;

pub use accrual::{
    classify_month, compute_owed, compute_owed_with_policy, month_shortfall, owed_months,
    year_statuses, OwedAmounts, PaymentStatus, ZeroPaymentPolicy,
};
pub use cache::{CachedSnapshot, MemoryCache, NoCache, SnapshotCache};
pub use config::{BuildingConfig, SheetNames};
pub use error::{LedgerError, Result};
pub use ingestion::*;
pub use ledger::{Ledger, LedgerBuilder, PaymentEntry, ResidentPayments, YearPayments};
pub use month::{MonthResolver, HEBREW_MONTH_ABBREVIATIONS};
pub use schema::*;
pub use service::{build_snapshot, ApartmentView, BuildingFund, FloorView, SheetSource, SheetTables};
pub use table::{parse_response, Cell, PseudoDate, Table};
pub use utils::*;

#[cfg(feature = "gviz")]
pub use gviz::GvizClient;
