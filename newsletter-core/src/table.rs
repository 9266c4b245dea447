//! Tabular data as handed over by the spreadsheet collaborator.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// One decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text form used when a cell lands in a free-text field.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => display_datetime(dt),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// Spreadsheets store bare times as a fraction of a day anchored at the epoch.
fn is_time_only(dt: &NaiveDateTime) -> bool {
    let epoch_days = [
        NaiveDate::from_ymd_opt(1899, 12, 30),
        NaiveDate::from_ymd_opt(1899, 12, 31),
    ];
    epoch_days.contains(&Some(dt.date()))
}

fn display_datetime(dt: &NaiveDateTime) -> String {
    if is_time_only(dt) {
        dt.format("%-I:%M %p").to_string()
    } else if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%m/%d/%Y").to_string()
    } else {
        dt.format("%m/%d/%Y %-I:%M %p").to_string()
    }
}

/// Header row plus data rows, in sheet order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Table { headers, rows }
    }

    /// Keep only the first `n` data rows.
    pub fn truncate(&mut self, n: usize) {
        self.rows.truncate(n);
    }

    /// Cell at (`row`, `column`), treating short rows as padded with empties.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}
