//! Splicing a new header date and event list into a previous campaign.
//!
//! Only two byte ranges are ever touched: the inner text of the header date
//! span, and the events area between the second top divider and the divider
//! above the marker section. Everything else is copied through verbatim.

use thiserror::Error;

use crate::event::EventRecord;
use crate::markers::TemplateMarkers;
use crate::markup::blocks::render_events;
use crate::markup::locate::{
    RegionBounds, anchored_table_start, enclosing_table_start, floor_boundary, table_bounds,
};

/// How far past the header anchor to look when the body anchor is absent.
const HEADER_WINDOW: usize = 8000;

/// A structural anchor the splicer needed but could not find.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAnchor {
    #[error("header region not found")]
    HeaderRegion,
    #[error("header date span not found")]
    HeaderDateSpan,
    #[error("body region not found")]
    BodyRegion,
    #[error("could not find two top divider blocks")]
    TopDividers,
    #[error("divider class is not on a table opening tag")]
    DividerOpening,
    #[error("divider table is not balanced")]
    UnbalancedDivider,
    #[error("marker section not found after the top dividers")]
    MarkerPhrase,
    #[error("no divider above the marker section")]
    DividerBeforeMarker,
}

/// Result of a splice: the document plus what did and didn't happen.
#[derive(Debug, Clone)]
pub struct SpliceReport {
    pub html: String,
    pub header_updated: bool,
    /// Span replaced by the event blocks, in offsets of the header-updated document.
    pub events_area: Option<RegionBounds>,
    pub warnings: Vec<MissingAnchor>,
}

impl SpliceReport {
    pub fn events_replaced(&self) -> bool {
        self.events_area.is_some()
    }

    /// The anchor that stopped the events replacement, if any.
    pub fn events_failure(&self) -> Option<MissingAnchor> {
        if self.events_replaced() {
            return None;
        }
        self.warnings
            .iter()
            .copied()
            .find(|w| !matches!(w, MissingAnchor::HeaderRegion | MissingAnchor::HeaderDateSpan))
    }
}

/// Byte range of the inner text of the header date span.
pub fn header_date_span(html: &str, markers: &TemplateMarkers) -> Result<RegionBounds, MissingAnchor> {
    let header_idx = html
        .find(&markers.header_anchor())
        .ok_or(MissingAnchor::HeaderRegion)?;

    let window_end = match html[header_idx..].find(&markers.body_anchor()) {
        Some(i) => header_idx + i,
        None => floor_boundary(html, header_idx + HEADER_WINDOW),
    };
    let window = html[header_idx..window_end].to_ascii_lowercase();
    let font_size = markers.header_font_size.to_ascii_lowercase();

    let mut pos = 0;
    while let Some(i) = window[pos..].find("<span") {
        let open = pos + i;
        let Some(gt) = window[open..].find('>').map(|j| open + j) else {
            break;
        };

        if has_font_size(&window[open..gt], &font_size) {
            let inner = gt + 1;
            let close = window[inner..]
                .find("</span>")
                .map(|j| inner + j)
                .ok_or(MissingAnchor::HeaderDateSpan)?;
            return Ok(RegionBounds {
                start: header_idx + inner,
                end: header_idx + close,
            });
        }

        pos = gt;
    }

    Err(MissingAnchor::HeaderDateSpan)
}

/// Whether a lowercased opening tag declares `font-size:<size>`.
fn has_font_size(tag: &str, size: &str) -> bool {
    tag.match_indices("font-size:").any(|(i, m)| {
        tag[i + m.len()..]
            .trim_start()
            .starts_with(size)
    })
}

/// Byte range of the events area: from the end of the second divider after
/// the body anchor up to the start of the last divider above the marker phrase.
pub fn events_area(html: &str, markers: &TemplateMarkers) -> Result<RegionBounds, MissingAnchor> {
    let divider = markers.divider_anchor();

    let body_idx = html
        .find(&markers.body_anchor())
        .ok_or(MissingAnchor::BodyRegion)?;
    let first = html[body_idx..]
        .find(&divider)
        .map(|i| body_idx + i)
        .ok_or(MissingAnchor::TopDividers)?;
    let second = html[first + 1..]
        .find(&divider)
        .map(|i| first + 1 + i)
        .ok_or(MissingAnchor::TopDividers)?;

    let second_open =
        anchored_table_start(html, second, &divider).ok_or(MissingAnchor::DividerOpening)?;
    let start = table_bounds(html, second_open)
        .ok_or(MissingAnchor::UnbalancedDivider)?
        .end;

    let lower = html.to_ascii_lowercase();
    let marker_idx = lower[start..]
        .find(&markers.marker_phrase.to_ascii_lowercase())
        .map(|i| start + i)
        .ok_or(MissingAnchor::MarkerPhrase)?;

    let mut last_divider = None;
    let mut pos = start;
    while let Some(idx) = html[pos..].find(&divider).map(|i| pos + i) {
        if idx >= marker_idx {
            break;
        }
        if let Some(open) = anchored_table_start(html, idx, &divider).filter(|o| *o >= start) {
            last_divider = Some(open);
        }
        pos = idx + 1;
    }

    let last_divider = last_divider.ok_or(MissingAnchor::DividerBeforeMarker)?;
    let mut end = table_bounds(html, last_divider)
        .ok_or(MissingAnchor::UnbalancedDivider)?
        .start;

    // A retired heading between the divider and the marker means the divider
    // heuristic stopped short; widen to the marker's enclosing table instead.
    let gap = &html[end..marker_idx];
    if markers.legacy_headings.iter().any(|h| gap.contains(h.as_str())) {
        if let Some(enclosing) = enclosing_table_start(html, marker_idx) {
            if enclosing > end && enclosing < marker_idx && enclosing > start {
                end = enclosing;
            }
        }
    }

    Ok(RegionBounds { start, end })
}

/// Replace the header date and the events area of `document`.
///
/// A missing header is only a warning. If the events area can't be located the
/// input is returned unchanged, so callers must check `events_replaced`.
pub fn splice_document(
    document: &str,
    header_label: &str,
    events: &[EventRecord],
    markers: &TemplateMarkers,
) -> SpliceReport {
    let mut warnings = Vec::new();

    let (html, header_updated) = match header_date_span(document, markers) {
        Ok(span) => {
            let mut html = String::with_capacity(document.len());
            html.push_str(&document[..span.start]);
            html.push_str(header_label);
            html.push_str(&document[span.end..]);
            (html, true)
        }
        Err(missing) => {
            warnings.push(missing);
            (document.to_string(), false)
        }
    };

    match events_area(&html, markers) {
        Ok(area) => {
            let events_html = render_events(events);
            let mut out = String::with_capacity(html.len() - area.len() + events_html.len());
            out.push_str(&html[..area.start]);
            out.push_str(&events_html);
            out.push_str(&html[area.end..]);

            SpliceReport {
                html: out,
                header_updated,
                events_area: Some(area),
                warnings,
            }
        }
        Err(missing) => {
            warnings.push(missing);
            SpliceReport {
                html: document.to_string(),
                header_updated: false,
                events_area: None,
                warnings,
            }
        }
    }
}
