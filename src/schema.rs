use crate::ledger::{Ledger, ResidentPayments};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DRIVE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"drive\.google\.com/file/d/([^/]+)").expect("valid drive file regex")
});

static DRIVE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"drive\.google\.com/open\?id=([^&]+)").expect("valid drive open regex")
});

/// Output of the payments projection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentsSheet {
    /// Resident names in payments-column order. Position `i` belongs to
    /// apartment `i + 1`.
    pub residents: Vec<String>,
    pub payments: Ledger,
    /// Distinct years, most recent first.
    pub years: Vec<i32>,
}

impl PaymentsSheet {
    pub fn resident_payments(&self, name: &str) -> Option<&ResidentPayments> {
        self.payments.get(name)
    }

    /// Positional join from apartment number to the resident occupying the
    /// matching payments column.
    pub fn resident_for_apartment(&self, apartment: u32) -> Option<&str> {
        let idx = usize::try_from(apartment).ok()?.checked_sub(1)?;
        self.residents.get(idx).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResidentInfo {
    pub family_name: String,
    pub first_name: String,
    pub property_owner: String,
    pub display_name: String,
}

impl ResidentInfo {
    /// Key matching the resident's payments column.
    pub fn join_key(&self) -> &str {
        if self.family_name.is_empty() {
            &self.first_name
        } else {
            &self.family_name
        }
    }
}

pub type ResidentDirectory = BTreeMap<String, ResidentInfo>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "type")]
    pub expense_type: String,
    pub price: f64,
    pub receipt: String,
    pub notes: String,
}

/// How an expense receipt should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptLink {
    None,
    Text(String),
    /// `image_url` is an embeddable thumbnail when the receipt lives on
    /// Google Drive, otherwise the original URL.
    Url { url: String, image_url: String },
}

impl Expense {
    pub fn receipt_link(&self) -> ReceiptLink {
        classify_receipt(&self.receipt)
    }

    pub fn notes(&self) -> Option<&str> {
        let notes = self.notes.trim();
        (!notes.is_empty() && notes != "null").then_some(notes)
    }
}

pub fn classify_receipt(receipt: &str) -> ReceiptLink {
    let receipt = receipt.trim();
    if receipt.is_empty() || receipt == "null" {
        return ReceiptLink::None;
    }
    if !receipt.starts_with("http") {
        return ReceiptLink::Text(receipt.to_string());
    }

    ReceiptLink::Url {
        url: receipt.to_string(),
        image_url: drive_thumbnail_url(receipt).unwrap_or_else(|| receipt.to_string()),
    }
}

/// Rewrites a Google Drive sharing link into its thumbnail endpoint.
pub fn drive_thumbnail_url(url: &str) -> Option<String> {
    let file_id = DRIVE_FILE_RE
        .captures(url)
        .or_else(|| DRIVE_OPEN_RE.captures(url))
        .map(|caps| caps[1].to_string())?;
    Some(format!(
        "https://drive.google.com/thumbnail?id={}&sz=w1000",
        file_id
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    /// 0 is the ground floor.
    pub number: usize,
    pub apartments: Vec<u32>,
}

/// The five normalized sheets. Rebuilt as a whole on every refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    pub payments: PaymentsSheet,
    pub total: f64,
    pub expenses: Vec<Expense>,
    pub building: Vec<Floor>,
    pub residents: ResidentDirectory,
}

/// Amounts owed by one resident, derived on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwedReport {
    pub resident_name: String,
    pub owed_current_year: f64,
    pub owed_last_year: f64,
    pub years: Vec<i32>,
    pub property_owner: String,
}

/// Everything the resident page needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentReport {
    pub name: String,
    pub payments: ResidentPayments,
    pub years: Vec<i32>,
    pub owed: f64,
    pub last_year_owed: f64,
    pub property_owner: String,
}

impl ResidentReport {
    pub fn owed_report(&self) -> OwedReport {
        OwedReport {
            resident_name: self.name.clone(),
            owed_current_year: self.owed,
            owed_last_year: self.last_year_owed,
            years: self.years.clone(),
            property_owner: self.property_owner.clone(),
        }
    }
}
