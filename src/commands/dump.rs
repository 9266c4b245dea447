use anyhow::{Context, Result};
use newsletter_core::artifacts::{Artifacts, safe_name};
use newsletter_core::config::NewsletterConfig;
use newsletter_core::service::EmailService;
use owo_colors::OwoColorize;

use super::{Status, mailchimp};
use crate::render::{Render, create_spinner};

/// Save the latest campaign's HTML into the artifacts directory.
pub async fn run(config: &NewsletterConfig, out: Option<String>) -> Result<Status> {
    let client = mailchimp(config)?;

    let spinner = create_spinner("Fetching latest campaign".to_string());
    let latest = client.latest_campaign().await;
    spinner.finish_and_clear();

    let Some(campaign) = latest? else {
        println!("No campaigns found.");
        return Ok(Status::NoCampaigns);
    };
    println!("{}", campaign.render());

    let content = client
        .content(&campaign.id)
        .await
        .with_context(|| format!("Failed to fetch content of campaign {}", campaign.id))?;

    if content.html().trim().is_empty() {
        println!("{}", "Campaign has no HTML content.".yellow());
        return Ok(Status::NoContent);
    }

    let name = out.unwrap_or_else(|| format!("latest_campaign_{}.html", safe_name(&campaign.id)));
    let path = Artifacts::new(config.artifacts_dir()).write(&name, content.html())?;
    println!("Saved HTML to {}", path.display());

    Ok(Status::Success)
}
