use crate::errors::CatalogError;
use crate::models::ServiceRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// The raw JSON shape the data-catalog endpoint sends back.
/// Everything except the dataset list is ignored.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    dataset: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    identifier: String,

    #[serde(default)]
    title: String,

    description: Option<String>,
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetches the upstream catalog document and maps it into service records.
    async fn fetch_catalog(&self) -> Result<Vec<ServiceRecord>, CatalogError>;
}

pub struct DataGovCatalog {
    client: reqwest::Client,
    url: String,
}

impl DataGovCatalog {
    /// Builds a client with a hard timeout on every outbound request.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for DataGovCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let records = parse_document(&body, Utc::now())?;

        tracing::debug!("fetched {} catalog record(s) from {}", records.len(), self.url);
        Ok(records)
    }
}

/// Decodes a catalog document and stamps each entry with the fetch time.
/// Entries without an identifier are skipped (presence check).
fn parse_document(
    body: &[u8],
    fetched_at: DateTime<Utc>,
) -> Result<Vec<ServiceRecord>, CatalogError> {
    let document: CatalogDocument = serde_json::from_slice(body)?;

    let mut records = Vec::with_capacity(document.dataset.len());
    for entry in document.dataset {
        if entry.identifier.is_empty() {
            tracing::warn!("skipping catalog entry without identifier: {:?}", entry.title);
            continue;
        }

        records.push(ServiceRecord {
            identifier: entry.identifier,
            title: entry.title,
            description: entry.description,
            fetched_at,
        });
    }

    Ok(records)
}

/// Canned upstream for handler and server tests.
#[cfg(test)]
pub(crate) enum StubCatalog {
    Records(Vec<ServiceRecord>),
    Status(u16),
}

#[cfg(test)]
impl StubCatalog {
    pub(crate) fn with_records(records: Vec<ServiceRecord>) -> Self {
        StubCatalog::Records(records)
    }

    pub(crate) fn with_status(status: u16) -> Self {
        StubCatalog::Status(status)
    }
}

#[cfg(test)]
#[async_trait]
impl CatalogSource for StubCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<ServiceRecord>, CatalogError> {
        match self {
            StubCatalog::Records(records) => Ok(records.clone()),
            StubCatalog::Status(status) => Err(CatalogError::HttpStatus(*status)),
        }
    }
}
