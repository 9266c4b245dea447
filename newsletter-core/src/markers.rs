//! Structural anchors of the campaign template.
//!
//! The splicer never builds a tree; it navigates the previous campaign's markup
//! through these literal strings. Defaults match the template currently in use
//! and every value can be overridden from the `[template]` config table.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateMarkers {
    /// `id` attribute of the header region.
    pub header_id: String,

    /// `id` attribute of the body region holding the events.
    pub body_id: String,

    /// Class carried by every divider table.
    pub divider_class: String,

    /// Font size of the header date span, e.g. `24px`.
    pub header_font_size: String,

    /// Colour used by the header text, used to spot the header section.
    pub header_colour: String,

    /// Section heading that follows the events area.
    pub marker_phrase: String,

    /// Short form of the marker section, used by the sections path and verification.
    pub marker_brand: String,

    /// Fragments of a retired heading that must not survive above the marker.
    pub legacy_headings: Vec<String>,

    /// Full retired heading checked after publishing.
    pub legacy_verify_heading: String,

    /// Classes identifying sections that hold event blocks.
    pub event_section_classes: Vec<String>,
}

impl Default for TemplateMarkers {
    fn default() -> Self {
        TemplateMarkers {
            header_id: "templateHeader".to_string(),
            body_id: "templateBody".to_string(),
            divider_class: "mcnDividerBlock".to_string(),
            header_font_size: "24px".to_string(),
            header_colour: "#011F5B".to_string(),
            marker_phrase: "Access Support with Mantra Health".to_string(),
            marker_brand: "Mantra Health".to_string(),
            legacy_headings: vec![
                "Stay Healthy".to_string(),
                "Connected This Summer".to_string(),
            ],
            legacy_verify_heading: "Stay Healthy & Connected This Summer".to_string(),
            event_section_classes: vec!["mcnCaption".to_string(), "mcnDividerBlock".to_string()],
        }
    }
}

impl TemplateMarkers {
    pub fn header_anchor(&self) -> String {
        format!("id=\"{}\"", self.header_id)
    }

    pub fn body_anchor(&self) -> String {
        format!("id=\"{}\"", self.body_id)
    }

    pub fn divider_anchor(&self) -> String {
        format!("class=\"{}\"", self.divider_class)
    }
}
