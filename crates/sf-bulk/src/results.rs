//! Result pages of a query job.

use csv::StringRecord;
use std::collections::VecDeque;

use quarry_sf_client::Response;

use crate::csv_rows::CsvRecordSplitter;
use crate::error::Result;

/// Where to continue after a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch again with this opaque locator.
    Locator(String),
    /// Results were not materialized yet; repeat the same request.
    Pending,
    /// This was the last page.
    Done,
}

impl NextPage {
    /// Normalize an `Sforce-Locator` header value. Absent, empty and the
    /// literal `null` all mean there are no further pages.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("null") => NextPage::Done,
            Some(locator) => NextPage::Locator(locator.to_string()),
        }
    }
}

/// One page of raw result rows.
///
/// The header row is read eagerly; data rows are parsed as the body streams
/// in, via [`ResultPage::next_row`].
#[derive(Debug)]
pub struct ResultPage {
    header: Option<StringRecord>,
    next: NextPage,
    body: Option<Response>,
    splitter: CsvRecordSplitter,
    ready: VecDeque<StringRecord>,
}

impl ResultPage {
    /// An empty page that asks for the same request to be repeated.
    pub(crate) fn pending() -> Self {
        Self {
            header: None,
            next: NextPage::Pending,
            body: None,
            splitter: CsvRecordSplitter::new(b','),
            ready: VecDeque::new(),
        }
    }

    /// Start reading a page body; returns once the header row is known.
    pub(crate) async fn from_response(response: Response, delimiter: u8) -> Result<Self> {
        let next = NextPage::from_header(response.sforce_locator());
        let mut page = Self {
            header: None,
            next,
            body: Some(response),
            splitter: CsvRecordSplitter::new(delimiter),
            ready: VecDeque::new(),
        };
        page.header = page.next_row().await?;
        Ok(page)
    }

    /// Column names of this page, if the body had any content.
    pub fn header(&self) -> Option<&StringRecord> {
        self.header.as_ref()
    }

    pub fn next_page(&self) -> &NextPage {
        &self.next
    }

    /// Next data row, reading more of the body as needed.
    pub async fn next_row(&mut self) -> Result<Option<StringRecord>> {
        loop {
            if let Some(row) = self.ready.pop_front() {
                return Ok(Some(row));
            }
            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };
            match body.chunk().await? {
                Some(bytes) => self.ready.extend(self.splitter.push(&bytes)?),
                None => {
                    self.body = None;
                    self.ready.extend(self.splitter.finish()?);
                }
            }
        }
    }

    /// Read every remaining data row.
    #[cfg(test)]
    pub(crate) async fn collect_rows(&mut self) -> Result<Vec<StringRecord>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}
