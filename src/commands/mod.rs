pub mod dump;
pub mod latest;
pub mod ping;
pub mod preview;
pub mod run;

use std::process::ExitCode;

use anyhow::Result;
use newsletter_core::config::NewsletterConfig;

use crate::mailchimp::MailchimpClient;

/// How a command finished, beyond plain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    NoCampaigns,
    NoContent,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Success => ExitCode::SUCCESS,
            Status::NoCampaigns => ExitCode::from(2),
            Status::NoContent => ExitCode::from(3),
        }
    }
}

/// Mailchimp client for the configured account.
pub fn mailchimp(config: &NewsletterConfig) -> Result<MailchimpClient> {
    let api_key = config.api_key()?;
    Ok(MailchimpClient::new(&config.server_prefix(), api_key)?)
}
