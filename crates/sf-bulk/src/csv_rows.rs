//! Incremental CSV record reading.
//!
//! Result bodies arrive in arbitrary chunks. Bytes are buffered until a line
//! terminator outside quotes closes a record; every complete region is then
//! handed to the `csv` reader, so quoted cells may contain delimiters, quotes
//! and newlines.

use csv::StringRecord;

use crate::error::Result;

#[derive(Debug)]
pub(crate) struct CsvRecordSplitter {
    delimiter: u8,
    buf: Vec<u8>,
    scanned: usize,
    in_quotes: bool,
}

impl CsvRecordSplitter {
    pub(crate) fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            buf: Vec::new(),
            scanned: 0,
            in_quotes: false,
        }
    }

    /// Feed a chunk; returns the records it completed.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Result<Vec<StringRecord>> {
        self.buf.extend_from_slice(chunk);

        let mut boundary = None;
        for (offset, byte) in self.buf[self.scanned..].iter().enumerate() {
            match byte {
                b'"' => self.in_quotes = !self.in_quotes,
                b'\n' if !self.in_quotes => boundary = Some(self.scanned + offset + 1),
                _ => {}
            }
        }
        self.scanned = self.buf.len();

        let Some(end) = boundary else {
            return Ok(Vec::new());
        };
        let complete: Vec<u8> = self.buf.drain(..end).collect();
        self.scanned -= end;
        self.parse(&complete)
    }

    /// Flush a final record that had no trailing line terminator.
    pub(crate) fn finish(&mut self) -> Result<Vec<StringRecord>> {
        let rest = std::mem::take(&mut self.buf);
        self.scanned = 0;
        self.in_quotes = false;
        if rest.iter().all(|b| matches!(b, b'\r' | b'\n')) {
            return Ok(Vec::new());
        }
        self.parse(&rest)
    }

    fn parse(&self, region: &[u8]) -> Result<Vec<StringRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(region);

        reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Into::into)
    }
}
