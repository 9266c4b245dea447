//! Error types for the newsletter automation.

use thiserror::Error;

use crate::markup::splice::MissingAnchor;
use crate::verify::VerificationFailure;

/// Errors that can occur while building or publishing a newsletter.
#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Email service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Email service request failed: {0}")]
    Transport(String),

    #[error("Events area was not updated: {0}")]
    EventsNotUpdated(MissingAnchor),

    #[error("Campaign '{0}' has no audience list id")]
    MissingListId(String),

    #[error("Template sections: {0}")]
    Sections(String),

    #[error("Verification failed for campaign '{campaign_id}': {failure}")]
    Verification {
        campaign_id: String,
        failure: VerificationFailure,
    },

    #[error("Could not compute schedule: {0}")]
    Schedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for newsletter operations.
pub type NewsletterResult<T> = Result<T, NewsletterError>;
