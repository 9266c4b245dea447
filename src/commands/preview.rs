use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use newsletter_core::artifacts::Artifacts;
use newsletter_core::config::NewsletterConfig;
use newsletter_core::extract::upcoming_events;
use newsletter_core::markup::{SpliceReport, splice_document};
use newsletter_core::schedule::{ScheduleSpec, today_in};
use newsletter_core::service::EventSource;
use newsletter_core::table::Table;
use owo_colors::OwoColorize;

use super::Status;
use crate::render::{Render, create_spinner};
use crate::spreadsheet::{SpreadsheetUrl, decode_workbook};

struct Preview {
    header_label: String,
    events: usize,
    report: SpliceReport,
    path: PathBuf,
}

/// Splice upcoming events into a local HTML file without touching Mailchimp.
///
/// Events come from `sheet_file` when given, otherwise from the configured link.
pub async fn run(config: &NewsletterConfig, html: &Path, sheet_file: Option<&Path>) -> Result<Status> {
    let table = match sheet_file {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            decode_workbook(bytes)?
        }
        None => {
            let sheet = SpreadsheetUrl::new(config.sheet_url()?)?;
            let spinner = create_spinner("Downloading spreadsheet".to_string());
            let table = sheet.fetch_table().await;
            spinner.finish_and_clear();
            table?
        }
    };

    let preview = write_preview(config, html, table, Utc::now())?;

    println!(
        "{} {} with {} event(s)",
        "Preview:".cyan(),
        preview.header_label,
        preview.events
    );
    if !preview.report.header_updated {
        println!("   {}", "header date left unchanged".yellow());
    }
    if !preview.report.events_replaced() {
        println!("   {}", "events area left unchanged".yellow());
    }
    for warning in &preview.report.warnings {
        println!("{}", warning.render());
    }
    println!("   {}", preview.path.display().to_string().dimmed());

    Ok(Status::Success)
}

fn write_preview(
    config: &NewsletterConfig,
    html: &Path,
    mut table: Table,
    now: DateTime<Utc>,
) -> Result<Preview> {
    let document = std::fs::read_to_string(html)
        .with_context(|| format!("Failed to read {}", html.display()))?;

    table.truncate(config.spreadsheet.max_rows);

    let tz = config.timezone()?;
    let spec = ScheduleSpec::for_tomorrow(now, tz, config.schedule.send_hour)?;
    let events = upcoming_events(&table, today_in(now, tz));

    let report = splice_document(&document, &spec.header_label, &events, &config.template);

    let stem = html
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let name = format!("preview_{stem}_{}.html", now.format("%Y%m%d_%H%M%S"));
    let path = Artifacts::new(config.artifacts_dir()).write(&name, &report.html)?;

    Ok(Preview {
        header_label: spec.header_label,
        events: events.len(),
        report,
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use newsletter_core::markup::MissingAnchor;
    use newsletter_core::table::Cell;

    const CAMPAIGN: &str = r#"<table id="templateHeader"><tr><td><span style="font-size:24px">March 1st, 2024</span></td></tr></table><table id="templateBody"><tr><td><table class="mcnDividerBlock"><tr><td></td></tr></table><p>Intro</p><table class="mcnDividerBlock"><tr><td></td></tr></table><p>Old event</p><table class="mcnDividerBlock"><tr><td></td></tr></table><h2>Access Support with Mantra Health</h2></td></tr></table>"#;

    fn table() -> Table {
        Table::new(
            vec!["Event Title".into(), "Date".into()],
            vec![
                vec![Cell::Text("Past Talk".into()), Cell::Text("02/01/2024".into())],
                vec![Cell::Text("Spring Gala".into()), Cell::Text("03/09/2024".into())],
            ],
        )
    }

    fn setup(html: &str) -> (tempfile::TempDir, NewsletterConfig, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("campaign.html");
        std::fs::write(&input, html).unwrap();

        let config = NewsletterConfig {
            artifacts_dir: tmp.path().join("artifacts"),
            ..Default::default()
        };
        (tmp, config, input)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_preview_writes_spliced_copy() {
        let (_tmp, config, input) = setup(CAMPAIGN);

        let preview = write_preview(&config, &input, table(), now()).unwrap();

        assert_eq!(preview.header_label, "March 2nd, 2024");
        assert_eq!(preview.events, 1);
        assert!(preview.report.warnings.is_empty());
        assert_eq!(
            preview.path,
            config.artifacts_dir().join("preview_campaign_20240301_150000.html")
        );

        let written = std::fs::read_to_string(&preview.path).unwrap();
        assert!(written.contains("Spring Gala"));
        assert!(!written.contains("Old event"));
        // The input file is left alone
        assert_eq!(std::fs::read_to_string(&input).unwrap(), CAMPAIGN);
    }

    #[test]
    fn test_preview_reports_missing_anchor() {
        let (_tmp, config, input) = setup(&CAMPAIGN.replace("templateBody", "main"));

        let preview = write_preview(&config, &input, table(), now()).unwrap();

        assert!(!preview.report.events_replaced());
        assert_eq!(preview.report.events_failure(), Some(MissingAnchor::BodyRegion));
        assert!(preview.path.exists());
    }

    #[test]
    fn test_preview_missing_input_is_an_error() {
        let (tmp, config, _input) = setup(CAMPAIGN);
        let missing = tmp.path().join("nope.html");
        assert!(write_preview(&config, &missing, table(), now()).is_err());
    }
}
