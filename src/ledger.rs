use crate::schema::PaymentsSheet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const MONTHS_PER_YEAR: usize = 12;

/// One cell of the payment grid. `amount: None` means nothing was recorded,
/// `Some(0.0)` is an explicit zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub month: usize,
    pub amount: Option<f64>,
}

pub type YearPayments = [Option<PaymentEntry>; MONTHS_PER_YEAR];
pub type ResidentPayments = BTreeMap<i32, YearPayments>;

/// Resident name → year → month.
pub type Ledger = BTreeMap<String, ResidentPayments>;

pub fn empty_year() -> YearPayments {
    [None; MONTHS_PER_YEAR]
}

/// Accumulates the resident × year × month grid in a single pass over the
/// payments rows.
#[derive(Debug, Default)]
pub struct LedgerBuilder {
    residents: Vec<String>,
    payments: Ledger,
    years: BTreeSet<i32>,
}

impl LedgerBuilder {
    pub fn new(residents: Vec<String>) -> Self {
        let payments = residents
            .iter()
            .map(|name| (name.clone(), ResidentPayments::new()))
            .collect();
        Self {
            residents,
            payments,
            years: BTreeSet::new(),
        }
    }

    pub fn add_year(&mut self, year: i32) {
        self.years.insert(year);
    }

    /// Writes one entry, allocating an empty year the first time a
    /// resident/year pair is touched. Unknown residents and out-of-range
    /// months are ignored.
    pub fn record(&mut self, resident: &str, year: i32, month: usize, amount: Option<f64>) {
        if month >= MONTHS_PER_YEAR {
            return;
        }
        let Some(by_year) = self.payments.get_mut(resident) else {
            return;
        };
        let slots = by_year.entry(year).or_insert_with(empty_year);
        slots[month] = Some(PaymentEntry { month, amount });
    }

    pub fn finish(self) -> PaymentsSheet {
        PaymentsSheet {
            residents: self.residents,
            payments: self.payments,
            years: self.years.into_iter().rev().collect(),
        }
    }
}
