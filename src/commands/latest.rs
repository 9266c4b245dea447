use anyhow::Result;
use newsletter_core::config::NewsletterConfig;
use newsletter_core::service::EmailService;

use super::{Status, mailchimp};
use crate::render::{Render, create_spinner};

pub async fn run(config: &NewsletterConfig) -> Result<Status> {
    let client = mailchimp(config)?;

    let spinner = create_spinner("Fetching latest campaign".to_string());
    let latest = client.latest_campaign().await;
    spinner.finish_and_clear();

    match latest? {
        Some(campaign) => {
            println!("{}", campaign.render());
            Ok(Status::Success)
        }
        None => {
            println!("No campaigns found.");
            Ok(Status::NoCampaigns)
        }
    }
}
