//! Normalized event records.

use serde::{Deserialize, Serialize};

/// One upcoming event, as read from a spreadsheet row.
///
/// Every field may be blank; only rows that passed the upcoming-date filter
/// become records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    pub description: String,
    /// Event date as `MM/DD/YYYY`.
    pub date_display: String,
    pub time: String,
    pub location: String,
    pub link: String,
    pub image_url: String,
}
