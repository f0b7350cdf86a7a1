//! Validation helpers for values interpolated into SOQL and URL paths.
//!
//! Names that end up inside a statement or a request path must pass these
//! checks first:
//!
//! ```rust
//! use quarry_sf_client::security::{soql, url};
//!
//! assert!(soql::is_safe_sobject_name("Opportunity"));
//! assert!(!soql::is_safe_field_name("Name FROM User--"));
//! assert!(url::is_valid_salesforce_id("7505e00000AbCdEAAV"));
//! ```

/// SOQL identifier checks.
pub mod soql {
    /// Validate that a field name contains only safe characters.
    ///
    /// Field names start with a letter and contain only ASCII alphanumerics
    /// and underscores (which covers the `__c` / `__r` custom suffixes).
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        }
    }

    /// Validate a relationship path such as `Owner.Manager.Name`.
    #[must_use]
    pub fn is_safe_field_path(path: &str) -> bool {
        path.split('.').all(is_safe_field_name)
    }

    /// Validate that an SObject name is safe.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// URL path helpers.
pub mod url {
    /// Percent-encode a value for use as a single path segment or parameter.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Salesforce IDs (records and jobs alike) are 15 or 18 ASCII alphanumerics.
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
