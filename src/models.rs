use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted data-catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(rename = "id")]
    pub identifier: String,

    pub title: String,

    pub description: Option<String>,

    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}
