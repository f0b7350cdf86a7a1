use tracing::instrument;

use quarry_sf_client::security::soql;

use crate::describe::{DescribeGlobalResult, DescribeSObjectResult};
use crate::error::{Error, Result};
use crate::sobject::SObjectResource;

impl super::SalesforceRestClient {
    /// List every SObject visible to the user.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        self.client.rest_get("sobjects").await.map_err(Into::into)
    }

    /// Describe one SObject, including its full field catalog.
    ///
    /// This is equivalent to calling `/services/data/vXX.0/sobjects/{sobject}/describe`.
    #[instrument(skip(self))]
    pub async fn describe_sobject(&self, sobject: &str) -> Result<DescribeSObjectResult> {
        validate_sobject(sobject)?;
        let path = format!("sobjects/{}/describe", sobject);
        self.client.rest_get(&path).await.map_err(Into::into)
    }

    /// Handle for typed access to one SObject. The describe is fetched lazily
    /// and cached on the handle.
    pub fn sobject(&self, name: &str) -> Result<SObjectResource> {
        validate_sobject(name)?;
        Ok(SObjectResource::new(self.clone(), name))
    }
}

fn validate_sobject(name: &str) -> Result<()> {
    if soql::is_safe_sobject_name(name) {
        Ok(())
    } else {
        Err(Error::invalid("INVALID_SOBJECT", "Invalid SObject name"))
    }
}
