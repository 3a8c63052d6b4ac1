use crate::error::{LedgerError, Result};
use crate::service::SheetSource;
use log::debug;
use reqwest::{Client, Url};

const SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Reads published sheets through the visualization query endpoint.
#[derive(Clone)]
pub struct GvizClient {
    client: Client,
    spreadsheet_id: String,
    base_url: String,
}

impl GvizClient {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            spreadsheet_id: spreadsheet_id.into(),
            base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn sheet_url(&self, sheet_name: &str) -> Result<Url> {
        let endpoint = format!("{}/{}/gviz/tq", self.base_url, self.spreadsheet_id);
        Url::parse_with_params(&endpoint, &[("tqx", "out:json"), ("sheet", sheet_name)])
            .map_err(|e| LedgerError::InvalidConfig(format!("Invalid sheet URL: {}", e)))
    }
}

impl SheetSource for GvizClient {
    async fn fetch_sheet(&self, sheet_name: &str) -> Result<String> {
        let url = self.sheet_url(sheet_name)?;
        debug!("GET {}", url);

        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(LedgerError::Http {
                sheet: sheet_name.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(res.text().await?)
    }
}
