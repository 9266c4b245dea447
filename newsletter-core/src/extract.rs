//! Spreadsheet rows to upcoming event records.
//!
//! Column headers are free-form (they come from a sign-up form), so each field
//! is resolved by fuzzy substring matching against a short list of hints.
//! A field without a matching column is not an error; it reads as blank.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::event::EventRecord;
use crate::table::{Cell, Table};

/// Canonical event fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    Description,
    Date,
    Time,
    Location,
    Link,
    ImageUrl,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Description,
        Field::Date,
        Field::Time,
        Field::Location,
        Field::Link,
        Field::ImageUrl,
    ];

    /// Substrings looked for in normalized headers, in priority order.
    pub fn hints(self) -> &'static [&'static str] {
        match self {
            Field::Title => &["event title"],
            Field::Description => &["event description"],
            Field::Date => &["date"],
            Field::Time => &["time"],
            Field::Location => &["location"],
            Field::Link => &["event link"],
            Field::ImageUrl => &[
                "kindly provide the link to your event flyer",
                "link to your event flyer",
                "image",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Date => "date",
            Field::Time => "time",
            Field::Location => "location",
            Field::Link => "link",
            Field::ImageUrl => "image_url",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, collapse every run of non-alphanumerics into one space, trim.
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_space = false;

    for c in header.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Canonical field to spreadsheet column.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: BTreeMap<Field, (usize, String)>,
}

impl ColumnMapping {
    /// Resolve every field against `headers`; the first matching column wins.
    pub fn from_headers(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut columns = BTreeMap::new();

        for field in Field::ALL {
            let found = normalized
                .iter()
                .position(|n| field.hints().iter().any(|hint| n.contains(hint)));
            if let Some(index) = found {
                columns.insert(field, (index, headers[index].clone()));
            }
        }

        ColumnMapping { columns }
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).map(|(index, _)| *index)
    }

    /// Original header text of the column mapped to `field`.
    pub fn header(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(|(_, name)| name.as_str())
    }

    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !self.columns.contains_key(f))
            .collect()
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%A, %B %d, %Y",
    "%d %B %Y",
];

/// Best-effort date of a cell; `None` for anything that doesn't look like a date.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::DateTime(dt) => Some(dt.date()),
        Cell::Text(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Rows dated strictly after `today`, in sheet order.
///
/// Rows whose date doesn't parse are dropped. Without a date column nothing
/// can be upcoming, so the result is empty.
pub fn upcoming_events(table: &Table, today: NaiveDate) -> Vec<EventRecord> {
    let mapping = ColumnMapping::from_headers(&table.headers);

    let missing = mapping.missing();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        log::warn!(
            "Missing expected columns (treated as blank): {}",
            names.join(", ")
        );
    }

    for field in Field::ALL {
        if let Some(header) = mapping.header(field) {
            log::debug!("Column for {field}: {header:?}");
        }
    }

    let Some(date_col) = mapping.column(Field::Date) else {
        return Vec::new();
    };

    let mut events = Vec::new();
    let (mut blank, mut undated) = (0, 0);

    for row in 0..table.rows.len() {
        if table.rows[row].iter().all(Cell::is_empty) {
            blank += 1;
            continue;
        }
        let Some(date) = parse_date(table.cell(row, date_col)) else {
            undated += 1;
            continue;
        };
        if date <= today {
            continue;
        }

        let value = |field: Field| -> String {
            mapping
                .column(field)
                .map(|col| table.cell(row, col).display().trim().to_string())
                .unwrap_or_default()
        };

        events.push(EventRecord {
            title: value(Field::Title),
            description: value(Field::Description),
            date_display: date.format("%m/%d/%Y").to_string(),
            time: value(Field::Time),
            location: value(Field::Location),
            link: value(Field::Link),
            image_url: value(Field::ImageUrl),
        });
    }

    if blank + undated > 0 {
        log::debug!("Skipped {blank} blank and {undated} undated row(s)");
    }

    events
}
