use crate::error::{LedgerError, Result};
use crate::month::{validate_abbreviations, MonthResolver, HEBREW_MONTH_ABBREVIATIONS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SPREADSHEET_ID: &str = "1_zdYPJNYSifPeQPI5CtqhfnvgzOFgxjOUe0jJDVzo1c";
pub const DEFAULT_CACHE_KEY: &str = "manzel_data_v4";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_MONTHLY_DUE: f64 = 50.0;
pub const DEFAULT_EXPENSES_PER_PAGE: usize = 10;

/// Names of the five sheets read on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SheetNames {
    #[schemars(description = "Payments grid: period column, one column per resident, optional trailing 'year' column.")]
    pub payments: String,
    #[schemars(description = "Sheet holding the fund total in any numeric cell.")]
    pub total: String,
    #[schemars(description = "Expenses: type, amount, receipt, notes.")]
    pub expenses: String,
    #[schemars(description = "Building layout: one row per floor, top floor first, cells are apartment numbers.")]
    pub building: String,
    #[schemars(description = "Residents: family name, first name, property owner.")]
    pub residents: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            payments: "Payments".to_string(),
            total: "total".to_string(),
            expenses: "Expence".to_string(),
            building: "building".to_string(),
            residents: "Residents".to_string(),
        }
    }
}

impl SheetNames {
    pub fn all(&self) -> [&str; 5] {
        [
            &self.payments,
            &self.total,
            &self.expenses,
            &self.building,
            &self.residents,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BuildingConfig {
    #[schemars(description = "Id of the published spreadsheet.")]
    pub spreadsheet_id: String,

    pub sheets: SheetNames,

    #[schemars(description = "Fixed amount every resident owes per month.")]
    pub monthly_due: f64,

    #[schemars(description = "Key under which the normalized snapshot is cached.")]
    pub cache_key: String,

    #[schemars(description = "How long a cached snapshot stays fresh, in seconds.")]
    pub cache_ttl_secs: u64,

    #[schemars(
        description = "Twelve month abbreviations in calendar order, matched against formatted period cells."
    )]
    pub month_abbreviations: Vec<String>,

    pub expenses_per_page: usize,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: DEFAULT_SPREADSHEET_ID.to_string(),
            sheets: SheetNames::default(),
            monthly_due: DEFAULT_MONTHLY_DUE,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            month_abbreviations: HEBREW_MONTH_ABBREVIATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            expenses_per_page: DEFAULT_EXPENSES_PER_PAGE,
        }
    }
}

impl BuildingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.monthly_due.is_finite() || self.monthly_due <= 0.0 {
            return Err(LedgerError::InvalidConfig(format!(
                "monthly_due must be a positive amount, got {}",
                self.monthly_due
            )));
        }

        if self.cache_key.is_empty() {
            return Err(LedgerError::InvalidConfig(
                "cache_key must not be empty".to_string(),
            ));
        }

        if self.expenses_per_page == 0 {
            return Err(LedgerError::InvalidConfig(
                "expenses_per_page must be at least 1".to_string(),
            ));
        }

        if let Some(name) = self.sheets.all().iter().find(|name| name.trim().is_empty()) {
            return Err(LedgerError::InvalidConfig(format!(
                "sheet name '{}' must not be blank",
                name
            )));
        }

        validate_abbreviations(&self.month_abbreviations)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn month_resolver(&self) -> Result<MonthResolver> {
        MonthResolver::new(&self.month_abbreviations)
    }

    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(BuildingConfig);
        serde_json::to_value(schema).unwrap_or_default()
    }
}
