//! Fetch-all orchestration and the per-resident query surface.

use crate::accrual::{compute_owed, year_statuses, PaymentStatus};
use crate::cache::{CachedSnapshot, SnapshotCache};
use crate::config::BuildingConfig;
use crate::error::Result;
use crate::ingestion::{
    normalize_building, normalize_expenses, normalize_payments, normalize_residents,
    normalize_total,
};
use crate::ledger::MONTHS_PER_YEAR;
use crate::month::MonthResolver;
use crate::schema::{BuildingSnapshot, Expense, ResidentReport};
use crate::table::{parse_response, Table};
use crate::utils::{local_now, paginate, reference_period, timestamp_millis};
use chrono::{DateTime, FixedOffset, NaiveDate};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// Transport that returns the raw, envelope-wrapped text of one sheet.
#[allow(async_fn_in_trait)]
pub trait SheetSource {
    async fn fetch_sheet(&self, sheet_name: &str) -> Result<String>;
}

/// Parsed tables of the five sheets, before normalization.
#[derive(Debug, Clone, Default)]
pub struct SheetTables {
    pub payments: Table,
    pub total: Table,
    pub expenses: Table,
    pub building: Table,
    pub residents: Table,
}

/// Runs all five projections. The projections are independent of each other.
pub fn build_snapshot(
    tables: &SheetTables,
    resolver: &MonthResolver,
    today: NaiveDate,
) -> BuildingSnapshot {
    BuildingSnapshot {
        payments: normalize_payments(&tables.payments, resolver, today),
        total: normalize_total(&tables.total),
        expenses: normalize_expenses(&tables.expenses),
        building: normalize_building(&tables.building),
        residents: normalize_residents(&tables.residents),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentView {
    pub number: u32,
    /// Resident in the matching payments column, if any.
    pub resident: Option<String>,
    /// Current-year statuses, January first.
    pub statuses: [PaymentStatus; MONTHS_PER_YEAR],
}

impl ApartmentView {
    pub fn label(&self) -> String {
        self.resident
            .clone()
            .unwrap_or_else(|| format!("Apartment {}", self.number))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorView {
    pub number: usize,
    pub apartments: Vec<ApartmentView>,
}

impl BuildingSnapshot {
    pub fn resident_report(&self, name: &str, today: NaiveDate, monthly_due: f64) -> ResidentReport {
        let (current_year, current_month) = reference_period(today);
        let payments = self.payments.resident_payments(name);
        let owed = compute_owed(payments, current_year, current_month, monthly_due);

        ResidentReport {
            name: name.to_string(),
            payments: payments.cloned().unwrap_or_default(),
            years: self.payments.years.clone(),
            owed: owed.owed_current,
            last_year_owed: owed.owed_prior,
            property_owner: self
                .residents
                .get(name)
                .map(|info| info.property_owner.clone())
                .unwrap_or_default(),
        }
    }

    /// Floors top to bottom, each apartment joined to its resident by
    /// position and annotated with this year's statuses.
    pub fn building_view(&self, today: NaiveDate) -> Vec<FloorView> {
        let (current_year, _) = reference_period(today);

        self.building
            .iter()
            .map(|floor| FloorView {
                number: floor.number,
                apartments: floor
                    .apartments
                    .iter()
                    .map(|&number| {
                        let resident = self.payments.resident_for_apartment(number);
                        let year = resident
                            .and_then(|name| self.payments.resident_payments(name))
                            .and_then(|by_year| by_year.get(&current_year));
                        ApartmentView {
                            number,
                            resident: resident.map(str::to_string),
                            statuses: year_statuses(year, current_year, today),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn expenses_page(&self, page: usize, per_page: usize) -> &[Expense] {
        paginate(&self.expenses, page, per_page)
    }
}

/// Entry point tying a sheet source, a snapshot cache and the configuration
/// together.
pub struct BuildingFund<S, C> {
    source: S,
    cache: C,
    config: BuildingConfig,
    resolver: MonthResolver,
}

impl<S: SheetSource, C: SnapshotCache> BuildingFund<S, C> {
    pub fn new(source: S, cache: C, config: BuildingConfig) -> Result<Self> {
        config.validate()?;
        let resolver = config.month_resolver()?;
        Ok(Self {
            source,
            cache,
            config,
            resolver,
        })
    }

    pub fn config(&self) -> &BuildingConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn fetch_all_data(&self, force_refresh: bool) -> Result<BuildingSnapshot> {
        self.fetch_all_data_at(local_now(), force_refresh).await
    }

    /// Returns the cached snapshot while it is fresh, otherwise fetches the
    /// five sheets concurrently and rebuilds it. A failure in any sheet fails
    /// the whole call and leaves the cache untouched.
    ///
    /// Freshness is measured on the absolute instant of `now`; its local date
    /// only picks the reference year for the payments sheet.
    pub async fn fetch_all_data_at(
        &self,
        now: DateTime<FixedOffset>,
        force_refresh: bool,
    ) -> Result<BuildingSnapshot> {
        let now_millis = timestamp_millis(&now);
        let key = &self.config.cache_key;

        if !force_refresh {
            if let Some(cached) = self.cache.get(key) {
                if cached.is_fresh(now_millis, self.config.cache_ttl()) {
                    info!("Serving building snapshot from cache '{}'", key);
                    return Ok(cached.data);
                }
                debug!("Cached snapshot '{}' expired", key);
            }
        }

        let sheets = &self.config.sheets;
        info!(
            "Fetching sheets for spreadsheet {}",
            self.config.spreadsheet_id
        );
        let (payments, total, expenses, building, residents) = futures::try_join!(
            self.fetch_table(&sheets.payments),
            self.fetch_table(&sheets.total),
            self.fetch_table(&sheets.expenses),
            self.fetch_table(&sheets.building),
            self.fetch_table(&sheets.residents),
        )?;

        let tables = SheetTables {
            payments,
            total,
            expenses,
            building,
            residents,
        };
        let snapshot = build_snapshot(&tables, &self.resolver, now.date_naive());

        if let Err(e) = self
            .cache
            .set(key, &CachedSnapshot::new(snapshot.clone(), now_millis))
        {
            warn!("Failed to cache building snapshot: {}", e);
        }

        Ok(snapshot)
    }

    async fn fetch_table(&self, sheet_name: &str) -> Result<Table> {
        let parsed = match self.source.fetch_sheet(sheet_name).await {
            Ok(raw) => parse_response(&raw),
            Err(e) => Err(e),
        };
        parsed.inspect_err(|e| error!("Error fetching sheet \"{}\": {}", sheet_name, e))
    }

    pub async fn get_resident_data(&self, name: &str) -> Result<ResidentReport> {
        self.get_resident_data_at(name, local_now()).await
    }

    pub async fn get_resident_data_at(
        &self,
        name: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<ResidentReport> {
        let snapshot = self.fetch_all_data_at(now, false).await?;
        Ok(snapshot.resident_report(name, now.date_naive(), self.config.monthly_due))
    }
}
