//! Events spreadsheet: downloaded over HTTP, decoded with calamine.

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use newsletter_core::service::EventSource;
use newsletter_core::table::{Cell, Table};
use newsletter_core::{NewsletterError, NewsletterResult};
use url::Url;

/// A workbook behind a direct-download link.
pub struct SpreadsheetUrl {
    http: reqwest::Client,
    url: Url,
}

impl SpreadsheetUrl {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid spreadsheet link: {url}"))?;
        Ok(Self {
            http: reqwest::Client::new(),
            url,
        })
    }
}

impl EventSource for SpreadsheetUrl {
    async fn fetch_table(&self) -> NewsletterResult<Table> {
        log::info!("Downloading spreadsheet from {}", self.url.host_str().unwrap_or("?"));

        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| NewsletterError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NewsletterError::Spreadsheet(format!(
                "download failed with status {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| NewsletterError::Transport(e.to_string()))?;

        decode_workbook(bytes.to_vec())
    }
}

/// First sheet of a workbook (xlsx, xls, ods) as a header row plus data rows.
pub fn decode_workbook(bytes: Vec<u8>) -> NewsletterResult<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| NewsletterError::Spreadsheet(format!("could not open workbook: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| NewsletterError::Spreadsheet("workbook has no sheets".into()))?
        .map_err(|e| NewsletterError::Spreadsheet(format!("could not read first sheet: {e}")))?;

    Ok(table_from_range(&range))
}

fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|c| cell_from_data(c).display()).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Table::new(headers, rows)
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match from_excel_serial(dt.as_f64()) {
            Some(dt) => Cell::DateTime(dt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Excel serial date (days since 1899-12-30, fraction is time of day).
fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
