//! Checks run against content read back from the email service.

use thiserror::Error;

use crate::markers::TemplateMarkers;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("header date '{0}' not present after update")]
    HeaderMissing(String),

    #[error("'{heading}' still appears before '{marker}'")]
    LegacyBeforeMarker { heading: String, marker: String },
}

/// Confirm the header label landed and the retired heading is gone from above the marker.
pub fn verify_published(
    html: &str,
    header_label: &str,
    markers: &TemplateMarkers,
) -> Result<(), VerificationFailure> {
    if !html.contains(header_label) {
        return Err(VerificationFailure::HeaderMissing(header_label.to_string()));
    }

    let heading = &markers.legacy_verify_heading;
    let encoded = heading.replace('&', "&amp;");
    let legacy = [html.find(heading.as_str()), html.find(&encoded)]
        .into_iter()
        .flatten()
        .min();
    let marker = html.find(&markers.marker_brand);
    if let (Some(legacy), Some(marker)) = (legacy, marker) {
        if legacy < marker {
            return Err(VerificationFailure::LegacyBeforeMarker {
                heading: markers.legacy_verify_heading.clone(),
                marker: markers.marker_brand.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_with_label_and_no_legacy() {
        let html = "<span>March 2nd, 2024</span><h2>Mantra Health</h2>";
        assert_eq!(verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()), Ok(()));
    }

    #[test]
    fn missing_label_fails() {
        let html = "<span>March 1st, 2024</span>";
        assert_eq!(
            verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()),
            Err(VerificationFailure::HeaderMissing("March 2nd, 2024".into()))
        );
    }

    #[test]
    fn legacy_above_marker_fails() {
        let html = "March 2nd, 2024 Stay Healthy & Connected This Summer ... Mantra Health";
        assert!(matches!(
            verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()),
            Err(VerificationFailure::LegacyBeforeMarker { .. })
        ));
    }

    #[test]
    fn legacy_below_marker_is_fine() {
        let html = "March 2nd, 2024 Mantra Health ... Stay Healthy & Connected This Summer";
        assert!(verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()).is_ok());
    }

    #[test]
    fn entity_encoded_legacy_above_marker_fails() {
        let html = "<span>March 2nd, 2024</span><h1>Stay Healthy &amp; Connected This Summer</h1><h2>Access Support with Mantra Health</h2>";
        assert!(matches!(
            verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()),
            Err(VerificationFailure::LegacyBeforeMarker { .. })
        ));

        let html = "<span>March 2nd, 2024</span><h2>Mantra Health</h2><h1>Stay Healthy &amp; Connected This Summer</h1>";
        assert!(verify_published(html, "March 2nd, 2024", &TemplateMarkers::default()).is_ok());
    }
}
