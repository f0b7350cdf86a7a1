use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

use quarry_sf_client::security::soql;

use crate::error::{Error, Result};

/// Usage of one org limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Limit {
    #[serde(rename = "Max")]
    pub max: i64,
    #[serde(rename = "Remaining")]
    pub remaining: i64,
}

impl Limit {
    pub fn used(&self) -> i64 {
        self.max - self.remaining
    }
}

/// Approximate number of records stored for an SObject.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordCount {
    pub name: String,
    pub count: i64,
}

#[derive(Deserialize)]
struct RecordCountResponse {
    #[serde(rename = "sObjects")]
    sobjects: Vec<RecordCount>,
}

impl super::SalesforceRestClient {
    /// Get API limits for the org, keyed by limit name (e.g. `DailyBulkV2QueryJobs`).
    #[instrument(skip(self))]
    pub async fn limits(&self) -> Result<HashMap<String, Limit>> {
        self.client.rest_get("limits").await.map_err(Into::into)
    }

    /// Record counts for the named SObjects, or every object when `sobjects` is empty.
    #[instrument(skip(self))]
    pub async fn record_count(&self, sobjects: &[&str]) -> Result<Vec<RecordCount>> {
        let mut request = self.client.get(&self.client.rest_url("limits/recordCount"));
        if !sobjects.is_empty() {
            if let Some(bad) = sobjects.iter().find(|s| !soql::is_safe_sobject_name(s)) {
                return Err(Error::invalid(
                    "INVALID_SOBJECT",
                    format!("Invalid SObject name: {bad}"),
                ));
            }
            request = request.query("sObjects", sobjects.join(","));
        }

        let response = self.client.execute(request).await?;
        let body: RecordCountResponse = response.json().await?;
        Ok(body.sobjects)
    }

    /// Get available API versions.
    #[instrument(skip(self))]
    pub async fn versions(&self) -> Result<Vec<super::ApiVersion>> {
        let url = format!("{}/services/data", self.client.instance_url());
        self.client.get_json(&url).await.map_err(Into::into)
    }

    /// Resources available at the configured API version, keyed by name.
    #[instrument(skip(self))]
    pub async fn resources(&self) -> Result<HashMap<String, String>> {
        self.client.rest_get("").await.map_err(Into::into)
    }
}
