//! Describe operations and types.
//!
//! Field descriptors here are the catalog the bulk query engine validates
//! column selections against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::field_type::FieldType;

/// Result of the describeGlobal operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    /// Character encoding (e.g., "UTF-8").
    pub encoding: String,

    /// Maximum batch size for composite operations.
    #[serde(rename = "maxBatchSize")]
    pub max_batch_size: u32,

    /// All SObjects accessible to the user.
    pub sobjects: Vec<SObjectBasicInfo>,
}

/// Basic information about an SObject from describeGlobal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SObjectBasicInfo {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural")]
    pub label_plural: String,
    #[serde(rename = "keyPrefix")]
    pub key_prefix: Option<String>,
    pub custom: bool,
    pub queryable: bool,
    pub retrieveable: bool,
    #[serde(default)]
    pub urls: HashMap<String, String>,
}

/// SObject describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeSObjectResult {
    pub name: String,
    pub label: String,
    #[serde(rename = "labelPlural")]
    pub label_plural: Option<String>,
    #[serde(rename = "keyPrefix")]
    pub key_prefix: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub queryable: bool,
    #[serde(default)]
    pub retrieveable: bool,
    /// Fields in catalog order.
    pub fields: Vec<FieldDescribe>,
    #[serde(default)]
    pub urls: HashMap<String, String>,
}

impl DescribeSObjectResult {
    /// Look up a field by API name. Salesforce names are case-insensitive.
    pub fn field(&self, name: &str) -> Option<&FieldDescribe> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    /// Fields that hold a single scalar value, in catalog order.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDescribe> {
        self.fields.iter().filter(|f| !f.kind().is_composite())
    }
}

/// Field describe result.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldDescribe {
    pub name: String,
    pub label: String,
    /// Raw type tag such as `string`, `picklist` or `address`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(rename = "soapType")]
    pub soap_type: Option<String>,
    pub custom: Option<bool>,

    /// Maximum length in characters; 0 for non-text types.
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,

    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub calculated: bool,

    /// Set on the components of a compound field (e.g. `BillingCity` -> `BillingAddress`).
    #[serde(rename = "compoundFieldName")]
    pub compound_field_name: Option<String>,

    #[serde(rename = "picklistValues", default)]
    pub picklist_values: Option<Vec<PicklistValue>>,
    #[serde(rename = "restrictedPicklist")]
    pub restricted_picklist: Option<bool>,
}

impl FieldDescribe {
    /// Parsed type tag.
    pub fn kind(&self) -> FieldType {
        FieldType::parse(&self.field_type)
    }

    /// Every picklist value in the catalog, including deactivated entries.
    /// Existing records may still hold a value that was deactivated later.
    pub fn all_picklist_values(&self) -> Vec<String> {
        self.picklist_values
            .iter()
            .flatten()
            .map(|pv| pv.value.clone())
            .collect()
    }
}

/// Picklist value for picklist fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PicklistValue {
    pub value: String,
    pub label: String,
    pub active: bool,
    #[serde(rename = "defaultValue")]
    pub default_value: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Lead",
            "label": "Lead",
            "fields": [
                {"name": "Id", "label": "Lead ID", "type": "id", "length": 18, "nillable": false},
                {"name": "Address", "label": "Address", "type": "address", "nillable": true},
                {
                    "name": "Rating",
                    "label": "Rating",
                    "type": "picklist",
                    "length": 40,
                    "nillable": true,
                    "picklistValues": [
                        {"value": "Hot", "label": "Hot", "active": true, "defaultValue": false},
                        {"value": "Retired", "label": "Retired", "active": false, "defaultValue": false}
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_describe_global_result_deser() {
        let json = r#"{
            "encoding": "UTF-8",
            "maxBatchSize": 200,
            "sobjects": [{
                "name": "Account",
                "label": "Account",
                "labelPlural": "Accounts",
                "keyPrefix": "001",
                "custom": false,
                "queryable": true,
                "retrieveable": true
            }]
        }"#;

        let result: DescribeGlobalResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.max_batch_size, 200);
        assert_eq!(result.sobjects[0].name, "Account");
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let describe: DescribeSObjectResult = serde_json::from_value(describe_json()).unwrap();

        assert_eq!(describe.field("rating").unwrap().name, "Rating");
        assert!(describe.field("Missing").is_none());
    }

    #[test]
    fn test_scalar_fields_skip_composites() {
        let describe: DescribeSObjectResult = serde_json::from_value(describe_json()).unwrap();
        let names: Vec<_> = describe.scalar_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Rating"]);
    }

    #[test]
    fn test_all_picklist_values_keep_inactive_entries() {
        let describe: DescribeSObjectResult = serde_json::from_value(describe_json()).unwrap();
        let rating = describe.field("Rating").unwrap();
        assert_eq!(
            rating.all_picklist_values(),
            vec!["Hot".to_string(), "Retired".to_string()]
        );
    }
}
