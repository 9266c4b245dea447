use anyhow::Result;
use newsletter_core::artifacts::Artifacts;
use newsletter_core::config::NewsletterConfig;
use newsletter_core::pipeline::{self, ContentMode, RunOptions, RunOutcome};

use super::{Status, mailchimp};
use crate::render::Render;
use crate::spreadsheet::SpreadsheetUrl;

pub async fn run(config: &NewsletterConfig, dry_run: bool, mode: ContentMode) -> Result<Status> {
    let client = mailchimp(config)?;
    let sheet = SpreadsheetUrl::new(config.sheet_url()?)?;
    let artifacts = Artifacts::new(config.artifacts_dir());

    let outcome = pipeline::run(
        &client,
        &sheet,
        config,
        &artifacts,
        &RunOptions::new(dry_run, mode),
    )
    .await?;

    println!("{}", outcome.render());

    Ok(match outcome {
        RunOutcome::NoCampaigns => Status::NoCampaigns,
        RunOutcome::NoContent { .. } => Status::NoContent,
        RunOutcome::NoUpcomingEvents { .. }
        | RunOutcome::DryRun { .. }
        | RunOutcome::Scheduled { .. } => Status::Success,
    })
}
