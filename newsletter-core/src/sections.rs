//! Template-sections update path.
//!
//! Campaigns built from a saved template expose their content as named
//! sections instead of one HTML blob. The header section is the one carrying a
//! long-form date; event sections are those built from caption or divider
//! blocks. Both are rewritten wholesale.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{NewsletterError, NewsletterResult};
use crate::markers::TemplateMarkers;

static LONG_DATE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(
        r"(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(st|nd|rd|th),\s+\d{4}",
    )
});

/// Matches header labels such as `March 2nd, 2024`.
fn long_date() -> NewsletterResult<&'static Regex> {
    LONG_DATE
        .as_ref()
        .map_err(|e| NewsletterError::Sections(format!("invalid long date pattern: {e}")))
}

/// Section name to section markup.
pub type Sections = BTreeMap<String, String>;

/// Sections after an update, with the keys that were rewritten.
#[derive(Debug, Clone)]
pub struct SectionsUpdate {
    pub sections: Sections,
    pub header_key: Option<String>,
    pub event_keys: Vec<String>,
}

/// The section holding the header date.
///
/// Prefers one containing a long-form date, then falls back to the header's
/// font size or colour.
pub fn header_section_key<'a>(
    sections: &'a Sections,
    markers: &TemplateMarkers,
) -> NewsletterResult<Option<&'a str>> {
    let long_date = long_date()?;
    let font_marker = format!("font-size:{}", markers.header_font_size);

    Ok(sections
        .iter()
        .find(|(_, v)| !v.is_empty() && long_date.is_match(v))
        .or_else(|| {
            sections.iter().find(|(_, v)| {
                !v.is_empty() && (v.contains(&font_marker) || v.contains(&markers.header_colour))
            })
        })
        .map(|(k, _)| k.as_str()))
}

/// Sections holding event blocks; the marker section is never one of them.
pub fn event_section_keys<'a>(sections: &'a Sections, markers: &TemplateMarkers) -> Vec<&'a str> {
    sections
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .filter(|(_, v)| !v.contains(&markers.marker_brand))
        .filter(|(_, v)| markers.event_section_classes.iter().any(|c| v.contains(c.as_str())))
        .map(|(k, _)| k.as_str())
        .collect()
}

/// Rewrite the header and event sections.
///
/// Dates in the header section are replaced in place; a header section with
/// no date is replaced entirely by the label. Fails when no section matched,
/// so a template change can't silently push the old content back.
pub fn update_sections(
    sections: &Sections,
    header_label: &str,
    events_html: &str,
    markers: &TemplateMarkers,
) -> NewsletterResult<SectionsUpdate> {
    let long_date = long_date()?;
    let header_key = header_section_key(sections, markers)?.map(str::to_string);
    let event_keys: Vec<String> = event_section_keys(sections, markers)
        .into_iter()
        .map(str::to_string)
        .collect();

    if header_key.is_none() && event_keys.is_empty() {
        return Err(NewsletterError::Sections(
            "template has sections, but none matched header or events".into(),
        ));
    }

    let mut updated = sections.clone();

    if let Some(key) = &header_key {
        let current = &sections[key];
        let replaced = if long_date.is_match(current) {
            long_date
                .replace_all(current, regex::NoExpand(header_label))
                .into_owned()
        } else {
            header_label.to_string()
        };
        updated.insert(key.clone(), replaced);
    }

    for key in &event_keys {
        updated.insert(key.clone(), events_html.to_string());
    }

    Ok(SectionsUpdate {
        sections: updated,
        header_key,
        event_keys,
    })
}

/// All section markup joined in key order, for verification and artifacts.
pub fn joined(sections: &Sections) -> String {
    sections.values().map(String::as_str).collect()
}
