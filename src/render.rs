//! Terminal rendering for run outcomes and campaigns.
//!
//! Extension traits over newsletter-core types, colored with owo_colors.

use indicatif::{ProgressBar, ProgressStyle};
use newsletter_core::markup::MissingAnchor;
use newsletter_core::pipeline::RunOutcome;
use newsletter_core::service::Campaign;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for RunOutcome {
    fn render(&self) -> String {
        match self {
            RunOutcome::NoCampaigns => "No sent campaigns found".yellow().to_string(),
            RunOutcome::NoContent { source_id } => {
                format!("Campaign {source_id} has no HTML content")
                    .yellow()
                    .to_string()
            }
            RunOutcome::NoUpcomingEvents { source_id } => format!(
                "{} {}",
                "No upcoming events; nothing scheduled.".yellow(),
                format!("(source campaign {source_id})").dimmed()
            ),
            RunOutcome::DryRun {
                source_id,
                header_label,
                proposed,
                events,
                warnings,
            } => {
                let mut lines = vec![format!(
                    "{} {} with {} from campaign {}",
                    "Dry run:".cyan(),
                    header_label,
                    pluralize_events(*events),
                    source_id
                )];
                lines.extend(warnings.iter().map(Render::render));
                lines.push(format!("   {}", proposed.display().to_string().dimmed()));
                lines.join("\n")
            }
            RunOutcome::Scheduled {
                campaign_id,
                header_label,
                schedule_time,
                proposed,
                events,
            } => format!(
                "{} {} ({}) as campaign {}\n   sends at {}\n   {}",
                "Scheduled".green(),
                header_label,
                pluralize_events(*events),
                campaign_id.bold(),
                schedule_time,
                proposed.display().to_string().dimmed()
            ),
        }
    }
}

impl Render for MissingAnchor {
    fn render(&self) -> String {
        format!("   {} {}", "!".yellow(), self.to_string().yellow())
    }
}

impl Render for Campaign {
    fn render(&self) -> String {
        let title = self.settings.title.as_deref().unwrap_or("(untitled)");
        let sent = self.send_time.as_deref().unwrap_or("not sent");
        format!("{} {} {}", self.id.bold(), title, sent.dimmed())
    }
}

fn pluralize_events(n: usize) -> String {
    if n == 1 {
        "1 event".to_string()
    } else {
        format!("{n} events")
    }
}

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["-", "\\", "|", "/"])
            .template("{msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
