//! Row decoding.

use csv::StringRecord;
use std::sync::Arc;

use quarry_sf_rest::{ColumnType, Record};

use crate::error::{Error, ErrorKind, Result};

/// Decoder for the rows of one job, derived from its header row.
#[derive(Debug, Clone)]
pub struct RowCodec {
    columns: Arc<[String]>,
    types: Vec<ColumnType>,
}

impl RowCodec {
    /// Pair each header column with its declared type. Header names are matched
    /// exactly first, then case-insensitively; a column nobody asked for is an
    /// internal error.
    pub fn new(header: &StringRecord, schema: &[(String, ColumnType)]) -> Result<Self> {
        let mut columns = Vec::with_capacity(header.len());
        let mut types = Vec::with_capacity(header.len());

        for name in header.iter() {
            let (_, column_type) = schema
                .iter()
                .find(|(n, _)| n == name)
                .or_else(|| schema.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
                .ok_or_else(|| Error::internal(format!("unexpected result column {name:?}")))?;
            columns.push(name.to_string());
            types.push(column_type.clone());
        }

        Ok(Self {
            columns: columns.into(),
            types,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True when `header` names the same columns this codec was built from.
    pub fn matches_header(&self, header: &StringRecord) -> bool {
        header.len() == self.columns.len()
            && header.iter().zip(self.columns.iter()).all(|(a, b)| a == b)
    }

    /// Decode one raw row. `row` is the 1-based data row number within the job.
    pub fn decode(&self, raw: &StringRecord, row: u64) -> Result<Record> {
        if raw.len() != self.columns.len() {
            return Err(Error::new(ErrorKind::Decode {
                row,
                column: String::new(),
                message: format!("expected {} cells, found {}", self.columns.len(), raw.len()),
            }));
        }

        let values = raw
            .iter()
            .zip(self.columns.iter().zip(&self.types))
            .map(|(cell, (column, column_type))| {
                column_type.parse_text(cell).map_err(|e| {
                    Error::new(ErrorKind::Decode {
                        row,
                        column: column.clone(),
                        message: e.to_string(),
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Record::new(Arc::clone(&self.columns), values))
    }
}
