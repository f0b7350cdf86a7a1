//! Mapping from described field types to decodable column types.
//!
//! [`ColumnType::for_field`] is the type-mapping function the bulk query engine
//! builds its decode schema with. It is pure: a field descriptor in, a column
//! type (or nothing, for composite fields) out.

use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

use crate::describe::FieldDescribe;
use crate::value::Value;

/// Salesforce field type tag, as reported by describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Id,
    Reference,
    String,
    TextArea,
    Phone,
    Url,
    Email,
    Combobox,
    MultiPicklist,
    EncryptedString,
    AnyType,
    Picklist,
    Int,
    Long,
    Double,
    Currency,
    Percent,
    Boolean,
    Date,
    DateTime,
    Time,
    Base64,
    Address,
    Location,
    /// A tag this crate does not know; decoded as text.
    Other(String),
}

impl FieldType {
    /// Parse a describe type tag. Unknown tags are kept verbatim.
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "id" => FieldType::Id,
            "reference" => FieldType::Reference,
            "string" => FieldType::String,
            "textarea" => FieldType::TextArea,
            "phone" => FieldType::Phone,
            "url" => FieldType::Url,
            "email" => FieldType::Email,
            "combobox" => FieldType::Combobox,
            "multipicklist" => FieldType::MultiPicklist,
            "encryptedstring" => FieldType::EncryptedString,
            "anytype" => FieldType::AnyType,
            "picklist" => FieldType::Picklist,
            "int" => FieldType::Int,
            "long" => FieldType::Long,
            "double" => FieldType::Double,
            "currency" => FieldType::Currency,
            "percent" => FieldType::Percent,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "time" => FieldType::Time,
            "base64" => FieldType::Base64,
            "address" => FieldType::Address,
            "location" => FieldType::Location,
            _ => FieldType::Other(tag.to_string()),
        }
    }

    /// Compound fields hold a structured value and cannot be selected in a bulk query.
    pub fn is_composite(&self) -> bool {
        matches!(self, FieldType::Address | FieldType::Location)
    }

    /// Scalar representation, or `None` for composite fields.
    pub fn scalar(&self) -> Option<ScalarType> {
        let scalar = match self {
            FieldType::Address | FieldType::Location => return None,
            FieldType::Int | FieldType::Long => ScalarType::Integer,
            FieldType::Double | FieldType::Currency | FieldType::Percent => ScalarType::Double,
            FieldType::Boolean => ScalarType::Boolean,
            FieldType::Date => ScalarType::Date,
            FieldType::DateTime => ScalarType::DateTime,
            FieldType::Time => ScalarType::Time,
            FieldType::Base64 => ScalarType::Bytes,
            _ => ScalarType::String,
        };
        Some(scalar)
    }
}

/// The value representation a column decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Double,
    Boolean,
    Date,
    DateTime,
    Time,
    Bytes,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::Integer => "integer",
            ScalarType::Double => "double",
            ScalarType::Boolean => "boolean",
            ScalarType::Date => "date",
            ScalarType::DateTime => "datetime",
            ScalarType::Time => "time",
            ScalarType::Bytes => "base64",
        };
        f.write_str(name)
    }
}

/// Why a cell could not be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("cannot parse {text:?} as {expected}")]
    Parse { expected: ScalarType, text: String },

    #[error("value is {len} characters, maximum is {max}")]
    TooLong { max: usize, len: usize },

    #[error("{value:?} is not an allowed value")]
    NotAllowed { value: String },

    #[error("value is required")]
    Missing,
}

/// Declared type of a result column: representation plus constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnType {
    pub scalar: ScalarType,
    /// Maximum length in characters for string values.
    pub max_length: Option<usize>,
    /// Empty cells decode to an absent value when set.
    pub nullable: bool,
    /// Enumerated values a string must be one of.
    pub allowed_values: Option<Vec<String>>,
}

impl ColumnType {
    /// An unconstrained, nullable column.
    pub fn new(scalar: ScalarType) -> Self {
        Self {
            scalar,
            max_length: None,
            nullable: true,
            allowed_values: None,
        }
    }

    /// Reject empty cells (or decode them to `""` for string columns).
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Limit string values to `max` characters.
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Restrict string values to an enumerated set.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Derive the column type of a described field. Returns `None` for
    /// composite fields.
    pub fn for_field(field: &FieldDescribe) -> Option<Self> {
        let kind = field.kind();
        let mut column = ColumnType::new(kind.scalar()?);
        column.nullable = field.nillable;

        if column.scalar == ScalarType::String {
            if let Some(len) = field.length.filter(|len| *len > 0) {
                column.max_length = Some(len as usize);
            }
            if kind == FieldType::Picklist {
                column.allowed_values = Some(field.all_picklist_values());
            }
        }

        Some(column)
    }

    /// Decode a cell from its text representation.
    pub fn parse_text(&self, text: &str) -> Result<Option<Value>, ValueError> {
        if text.is_empty() {
            return match (self.nullable, self.scalar) {
                (true, _) => Ok(None),
                (false, ScalarType::String) => Ok(Some(Value::String(String::new()))),
                (false, _) => Err(ValueError::Missing),
            };
        }

        let parse_err = || ValueError::Parse {
            expected: self.scalar,
            text: text.to_string(),
        };

        let value = match self.scalar {
            ScalarType::String => {
                self.check_string(text)?;
                Value::String(text.to_string())
            }
            ScalarType::Integer => Value::Integer(text.parse().map_err(|_| parse_err())?),
            ScalarType::Double => Value::Double(text.parse().map_err(|_| parse_err())?),
            ScalarType::Boolean => {
                if text.eq_ignore_ascii_case("true") {
                    Value::Boolean(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Value::Boolean(false)
                } else {
                    return Err(parse_err());
                }
            }
            ScalarType::Date => Value::Date(
                NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| parse_err())?,
            ),
            ScalarType::DateTime => Value::DateTime(parse_datetime(text).ok_or_else(parse_err)?),
            ScalarType::Time => Value::Time(
                NaiveTime::parse_from_str(text.trim_end_matches('Z'), "%H:%M:%S%.f")
                    .map_err(|_| parse_err())?,
            ),
            ScalarType::Bytes => Value::Bytes(Bytes::from(
                base64::engine::general_purpose::STANDARD
                    .decode(text)
                    .map_err(|_| parse_err())?,
            )),
        };

        Ok(Some(value))
    }

    /// Decode a field from a REST JSON record.
    pub fn from_json(&self, value: &serde_json::Value) -> Result<Option<Value>, ValueError> {
        match (value, self.scalar) {
            (serde_json::Value::Null, _) => self.parse_text(""),
            (serde_json::Value::String(s), _) => self.parse_text(s),
            (serde_json::Value::Bool(b), ScalarType::Boolean) => Ok(Some(Value::Boolean(*b))),
            (serde_json::Value::Number(n), ScalarType::Integer) => n
                .as_i64()
                .map(|i| Some(Value::Integer(i)))
                .ok_or_else(|| ValueError::Parse {
                    expected: ScalarType::Integer,
                    text: n.to_string(),
                }),
            (serde_json::Value::Number(n), ScalarType::Double) => n
                .as_f64()
                .map(|d| Some(Value::Double(d)))
                .ok_or_else(|| ValueError::Parse {
                    expected: ScalarType::Double,
                    text: n.to_string(),
                }),
            (other, expected) => Err(ValueError::Parse {
                expected,
                text: other.to_string(),
            }),
        }
    }

    fn check_string(&self, text: &str) -> Result<(), ValueError> {
        if let Some(max) = self.max_length {
            let len = text.chars().count();
            if len > max {
                return Err(ValueError::TooLong { max, len });
            }
        }
        if let Some(ref allowed) = self.allowed_values {
            if !allowed.iter().any(|v| v == text) {
                return Err(ValueError::NotAllowed {
                    value: text.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Bulk results use RFC 3339 (`...000Z`); REST JSON uses a `+0000` offset.
fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
