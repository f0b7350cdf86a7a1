//! Query specification.
//!
//! A [`QuerySpec`] is validated against the entity's field catalog when it is
//! built, so every invalid selection fails before any request is sent.

use quarry_sf_client::security::soql;
use quarry_sf_rest::{ColumnType, DescribeSObjectResult};

use crate::error::{Error, Result};
use crate::types::{ColumnDelimiter, CreateQueryJobRequest, LineEnding, QueryOperation};

/// A column to select.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// A field of the entity, typed from its describe.
    Field(String),
    /// A computed expression, emitted as `expression alias`. It cannot be
    /// looked up in the catalog, so its output type is declared here.
    Expression {
        alias: String,
        expression: String,
        column_type: ColumnType,
    },
}

impl Column {
    pub fn field(name: impl Into<String>) -> Self {
        Column::Field(name.into())
    }

    /// e.g. `Column::expression("AmountText", "FORMAT(Amount)", ColumnType::new(ScalarType::String))`
    pub fn expression(
        alias: impl Into<String>,
        expression: impl Into<String>,
        column_type: ColumnType,
    ) -> Self {
        Column::Expression {
            alias: alias.into(),
            expression: expression.into(),
            column_type,
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::field(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Field(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SelectedColumn {
    /// Output column name: the catalog field name or the alias.
    name: String,
    expression: Option<String>,
    column_type: ColumnType,
}

/// A validated bulk query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    entity: String,
    columns: Vec<SelectedColumn>,
    filter: Option<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    operation: QueryOperation,
    delimiter: ColumnDelimiter,
    line_ending: LineEnding,
}

impl QuerySpec {
    /// Start a query against the entity described by `describe`.
    pub fn builder(describe: &DescribeSObjectResult) -> QuerySpecBuilder<'_> {
        QuerySpecBuilder {
            describe,
            columns: None,
            filter: None,
            order_by: None,
            limit: None,
            operation: QueryOperation::default(),
            delimiter: ColumnDelimiter::default(),
            line_ending: LineEnding::default(),
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Output column names in select order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn operation(&self) -> QueryOperation {
        self.operation
    }

    pub fn delimiter(&self) -> ColumnDelimiter {
        self.delimiter
    }

    /// The SOQL statement text.
    pub fn statement(&self) -> String {
        let select = self
            .columns
            .iter()
            .map(|c| match c.expression {
                Some(ref expression) => format!("{} {}", expression, c.name),
                None => c.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut stmt = format!("SELECT {} FROM {}", select, self.entity);
        if let Some(ref filter) = self.filter {
            stmt.push_str(" WHERE ");
            stmt.push_str(filter);
        }
        if let Some(ref order_by) = self.order_by {
            stmt.push_str(" ORDER BY ");
            stmt.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            stmt.push_str(&format!(" LIMIT {}", limit));
        }
        stmt
    }

    /// Body of the job creation request.
    pub fn job_request(&self) -> CreateQueryJobRequest {
        CreateQueryJobRequest::new(self.statement())
            .with_operation(self.operation)
            .with_column_delimiter(self.delimiter)
            .with_line_ending(self.line_ending)
    }

    /// Decode schema: output name and declared type of each column.
    pub(crate) fn schema(&self) -> Vec<(String, ColumnType)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.column_type.clone()))
            .collect()
    }
}

/// Builder for [`QuerySpec`].
#[derive(Debug, Clone)]
pub struct QuerySpecBuilder<'a> {
    describe: &'a DescribeSObjectResult,
    columns: Option<Vec<Column>>,
    filter: Option<String>,
    order_by: Option<String>,
    limit: Option<u64>,
    operation: QueryOperation,
    delimiter: ColumnDelimiter,
    line_ending: LineEnding,
}

impl QuerySpecBuilder<'_> {
    /// Columns to select. Defaults to every non-composite field.
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// WHERE predicate, passed through as SOQL text.
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        self.filter = Some(predicate.into());
        self
    }

    /// ORDER BY clause, passed through as SOQL text.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn operation(mut self, operation: QueryOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn delimiter(mut self, delimiter: ColumnDelimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Validate the selection against the field catalog.
    pub fn build(self) -> Result<QuerySpec> {
        let describe = self.describe;
        if !soql::is_safe_sobject_name(&describe.name) {
            return Err(Error::specification(format!(
                "invalid entity name {:?}",
                describe.name
            )));
        }

        let mut columns: Vec<SelectedColumn> = Vec::new();
        match self.columns {
            None => {
                for field in describe.scalar_fields() {
                    if let Some(column_type) = ColumnType::for_field(field) {
                        columns.push(SelectedColumn {
                            name: field.name.clone(),
                            expression: None,
                            column_type,
                        });
                    }
                }
            }
            Some(requested) => {
                for column in requested {
                    let selected = select(describe, column)?;
                    if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(&selected.name)) {
                        columns.push(selected);
                    }
                }
            }
        }

        if columns.is_empty() {
            return Err(Error::specification(format!(
                "no columns selected from {}",
                describe.name
            )));
        }

        Ok(QuerySpec {
            entity: describe.name.clone(),
            columns,
            filter: self.filter,
            order_by: self.order_by,
            limit: self.limit,
            operation: self.operation,
            delimiter: self.delimiter,
            line_ending: self.line_ending,
        })
    }
}

fn select(describe: &DescribeSObjectResult, column: Column) -> Result<SelectedColumn> {
    match column {
        Column::Field(name) => {
            let field = describe.field(&name).ok_or_else(|| {
                Error::specification(format!("unknown field {}.{}", describe.name, name))
            })?;
            let column_type = ColumnType::for_field(field).ok_or_else(|| {
                Error::specification(format!(
                    "cannot query {} type field {}.{}",
                    field.field_type, describe.name, field.name
                ))
            })?;
            Ok(SelectedColumn {
                name: field.name.clone(),
                expression: None,
                column_type,
            })
        }
        Column::Expression {
            alias,
            expression,
            column_type,
        } => {
            if !soql::is_safe_field_name(&alias) {
                return Err(Error::specification(format!("invalid column alias {alias:?}")));
            }
            if expression.trim().is_empty() {
                return Err(Error::specification(format!(
                    "empty expression for column {alias}"
                )));
            }
            Ok(SelectedColumn {
                name: alias,
                expression: Some(expression),
                column_type,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use quarry_sf_rest::ScalarType;

    fn account() -> DescribeSObjectResult {
        serde_json::from_value(serde_json::json!({
            "name": "Account",
            "label": "Account",
            "fields": [
                {"name": "Id", "label": "Account ID", "type": "id", "length": 18, "nillable": false},
                {"name": "Name", "label": "Account Name", "type": "string", "length": 255, "nillable": false},
                {"name": "BillingAddress", "label": "Billing Address", "type": "address", "nillable": true},
                {"name": "AnnualRevenue", "label": "Annual Revenue", "type": "currency", "length": 0, "nillable": true},
                {"name": "ShippingLocation", "label": "Location", "type": "location", "nillable": true}
            ]
        }))
        .unwrap()
    }

    fn assert_spec_error(result: Result<QuerySpec>) {
        match result {
            Err(err) => assert!(matches!(err.kind, ErrorKind::Specification(_)), "{err}"),
            Ok(spec) => panic!("expected a specification error, built {}", spec.statement()),
        }
    }

    #[test]
    fn test_default_columns_skip_composites() {
        let describe = account();
        let spec = QuerySpec::builder(&describe).build().unwrap();
        assert_eq!(spec.statement(), "SELECT Id, Name, AnnualRevenue FROM Account");
    }

    #[test]
    fn test_every_subset_selects_exactly_its_columns() {
        let describe = account();
        let scalar = ["Id", "Name", "AnnualRevenue"];

        for mask in 1u32..(1 << scalar.len()) {
            let subset: Vec<&str> = scalar
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, name)| *name)
                .collect();

            let spec = QuerySpec::builder(&describe)
                .columns(subset.clone())
                .build()
                .unwrap();
            assert_eq!(spec.column_names().collect::<Vec<_>>(), subset);
            assert_eq!(
                spec.statement(),
                format!("SELECT {} FROM Account", subset.join(", "))
            );
        }
    }

    #[test]
    fn test_invalid_selections() {
        let describe = account();
        assert_spec_error(QuerySpec::builder(&describe).columns(Vec::<Column>::new()).build());
        assert_spec_error(QuerySpec::builder(&describe).columns(["Id", "Nope"]).build());
        assert_spec_error(QuerySpec::builder(&describe).columns(["BillingAddress"]).build());
        assert_spec_error(QuerySpec::builder(&describe).columns(["ShippingLocation"]).build());
        assert_spec_error(
            QuerySpec::builder(&describe)
                .columns([Column::expression(
                    "bad alias",
                    "COUNT(Id)",
                    ColumnType::new(ScalarType::Integer),
                )])
                .build(),
        );
    }

    #[test]
    fn test_only_composites_is_an_error() {
        let describe: DescribeSObjectResult = serde_json::from_value(serde_json::json!({
            "name": "Site__c",
            "label": "Site",
            "fields": [{"name": "Where__c", "label": "Where", "type": "location", "nillable": true}]
        }))
        .unwrap();
        assert_spec_error(QuerySpec::builder(&describe).build());
    }

    #[test]
    fn test_full_statement() {
        let describe = account();
        let spec = QuerySpec::builder(&describe)
            .columns([
                Column::field("id"),
                Column::field("Name"),
                Column::expression(
                    "Revenue",
                    "FORMAT(AnnualRevenue)",
                    ColumnType::new(ScalarType::String),
                ),
                Column::field("ID"),
            ])
            .filter("Name LIKE 'A%'")
            .order_by("Name DESC")
            .limit(50)
            .operation(QueryOperation::QueryAll)
            .build()
            .unwrap();

        assert_eq!(
            spec.statement(),
            "SELECT Id, Name, FORMAT(AnnualRevenue) Revenue FROM Account \
             WHERE Name LIKE 'A%' ORDER BY Name DESC LIMIT 50"
        );
        let request = spec.job_request();
        assert_eq!(request.operation, QueryOperation::QueryAll);
        assert_eq!(spec.schema()[2].1.scalar, ScalarType::String);
    }
}
