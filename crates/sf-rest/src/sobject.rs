//! Typed access to a single SObject.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::instrument;

use quarry_sf_client::security::url as url_security;

use crate::client::SalesforceRestClient;
use crate::describe::{DescribeSObjectResult, FieldDescribe};
use crate::error::{Error, ErrorKind, Result};
use crate::field_type::ColumnType;
use crate::record::Record;

/// Handle for one SObject, created by [`SalesforceRestClient::sobject`].
///
/// The first call that needs the field catalog fetches it; later calls reuse it.
#[derive(Debug)]
pub struct SObjectResource {
    client: SalesforceRestClient,
    name: String,
    describe: OnceCell<DescribeSObjectResult>,
}

impl SObjectResource {
    pub(crate) fn new(client: SalesforceRestClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            describe: OnceCell::new(),
        }
    }

    /// SObject API name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field catalog, fetched on first use.
    pub async fn describe(&self) -> Result<&DescribeSObjectResult> {
        self.describe
            .get_or_try_init(|| self.client.describe_sobject(&self.name))
            .await
    }

    /// Fetch one record by id with typed field values.
    ///
    /// `fields` defaults to every scalar field. Unknown or composite fields are
    /// rejected before any request is sent.
    #[instrument(skip(self, fields), fields(sobject = %self.name))]
    pub async fn get(&self, id: &str, fields: Option<&[&str]>) -> Result<Record> {
        if !url_security::is_valid_salesforce_id(id) {
            return Err(Error::invalid("INVALID_ID", "Invalid Salesforce ID format"));
        }

        let describe = self.describe().await?;
        let selected: Vec<(&FieldDescribe, ColumnType)> = match fields {
            Some(names) => names
                .iter()
                .map(|name| select_field(describe, name))
                .collect::<Result<_>>()?,
            None => describe
                .scalar_fields()
                .filter_map(|f| ColumnType::for_field(f).map(|t| (f, t)))
                .collect(),
        };

        let field_list = selected
            .iter()
            .map(|(f, _)| f.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let inner = self.client.inner();
        let request = inner
            .get(&inner.rest_url(&format!("sobjects/{}/{}", self.name, id)))
            .query("fields", field_list);
        let body: serde_json::Map<String, serde_json::Value> =
            inner.execute(request).await?.json().await?;

        let mut columns = Vec::with_capacity(selected.len());
        let mut values = Vec::with_capacity(selected.len());
        for (field, column_type) in &selected {
            let raw = body.get(&field.name).unwrap_or(&serde_json::Value::Null);
            let value = column_type.from_json(raw).map_err(|e| {
                Error::new(ErrorKind::Decode {
                    field: field.name.clone(),
                    message: e.to_string(),
                })
            })?;
            columns.push(field.name.clone());
            values.push(value);
        }

        Ok(Record::new(Arc::from(columns), values))
    }
}

fn select_field<'a>(
    describe: &'a DescribeSObjectResult,
    name: &str,
) -> Result<(&'a FieldDescribe, ColumnType)> {
    let field = describe.field(name).ok_or_else(|| {
        Error::invalid(
            "INVALID_FIELD",
            format!("No such field {}.{}", describe.name, name),
        )
    })?;
    let column_type = ColumnType::for_field(field).ok_or_else(|| {
        Error::invalid(
            "INVALID_FIELD",
            format!("Compound field {}.{} cannot be read as a scalar", describe.name, name),
        )
    })?;
    Ok((field, column_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_describe(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Opportunity/describe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Opportunity",
                "label": "Opportunity",
                "fields": [
                    {"name": "Id", "label": "Opportunity ID", "type": "id", "length": 18, "nillable": false},
                    {"name": "Amount", "label": "Amount", "type": "currency", "length": 0, "nillable": true},
                    {"name": "CloseDate", "label": "Close Date", "type": "date", "length": 0, "nillable": false},
                    {"name": "IsWon", "label": "Won", "type": "boolean", "length": 0, "nillable": false},
                    {"name": "ShippingAddress", "label": "Shipping", "type": "address", "nillable": true}
                ]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_decodes_scalar_fields() {
        let server = MockServer::start().await;
        mount_describe(&server).await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Opportunity/006xx000001AbCdAAK"))
            .and(query_param("fields", "Id,Amount,CloseDate,IsWon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributes": {"type": "Opportunity"},
                "Id": "006xx000001AbCdAAK",
                "Amount": 1500.5,
                "CloseDate": "2024-06-30",
                "IsWon": false
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Opportunity/006xx000001AbCdAAK"))
            .and(query_param("fields", "Amount"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Amount": null
            })))
            .mount(&server)
            .await;

        let client = SalesforceRestClient::new(server.uri(), "token").unwrap();
        let opportunity = client.sobject("Opportunity").unwrap();
        let record = opportunity.get("006xx000001AbCdAAK", None).await.unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("Amount"), Some(&Value::Double(1500.5)));
        assert_eq!(record.get("IsWon"), Some(&Value::Boolean(false)));
        assert_eq!(record.get("CloseDate").unwrap().to_string(), "2024-06-30");

        // second read reuses the cached describe
        let amount_only = opportunity
            .get("006xx000001AbCdAAK", Some(&["Amount"][..]))
            .await
            .unwrap();
        assert_eq!(amount_only.columns(), ["Amount".to_string()]);
        assert!(amount_only.get("Amount").is_none());
    }

    #[tokio::test]
    async fn test_get_rejects_bad_input_without_request() {
        let server = MockServer::start().await;
        mount_describe(&server).await;

        let client = SalesforceRestClient::new(server.uri(), "token").unwrap();
        let opportunity = client.sobject("Opportunity").unwrap();

        let err = opportunity.get("not-an-id", None).await.unwrap_err();
        assert!(err.to_string().contains("INVALID_ID"));

        let err = opportunity
            .get("006xx000001AbCdAAK", Some(&["ShippingAddress"][..]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("INVALID_FIELD"));

        let err = opportunity
            .get("006xx000001AbCdAAK", Some(&["Nope"][..]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("INVALID_FIELD"));
    }

    #[tokio::test]
    async fn test_get_reports_decode_errors() {
        let server = MockServer::start().await;
        mount_describe(&server).await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Opportunity/006xx000001AbCdAAK"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "CloseDate": null
            })))
            .mount(&server)
            .await;

        let client = SalesforceRestClient::new(server.uri(), "token").unwrap();
        let err = client
            .sobject("Opportunity")
            .unwrap()
            .get("006xx000001AbCdAAK", Some(&["CloseDate"][..]))
            .await
            .unwrap_err();

        match err.kind {
            ErrorKind::Decode { field, .. } => assert_eq!(field, "CloseDate"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
