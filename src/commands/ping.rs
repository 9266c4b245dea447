use anyhow::{Context, Result};
use newsletter_core::config::NewsletterConfig;
use owo_colors::OwoColorize;

use super::{Status, mailchimp};
use crate::render::create_spinner;

pub async fn run(config: &NewsletterConfig) -> Result<Status> {
    let client = mailchimp(config)?;

    let spinner = create_spinner(format!("Pinging {}", config.server_prefix()));
    let result = client.ping().await;
    spinner.finish_and_clear();

    let health = result.context("Mailchimp ping failed")?;
    println!("{} {}", "✓".green(), health);

    Ok(Status::Success)
}
