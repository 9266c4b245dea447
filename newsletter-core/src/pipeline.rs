//! The campaign orchestrator: one run from spreadsheet to scheduled campaign.
//!
//! Every read happens first. Nothing on the email service is created or changed
//! until the events are known, the new content is built, and the proposed
//! document has been written locally. A run that can't prove the events landed
//! stops before scheduling.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::artifacts::{Artifacts, safe_name};
use crate::config::NewsletterConfig;
use crate::error::{NewsletterError, NewsletterResult};
use crate::event::EventRecord;
use crate::extract::upcoming_events;
use crate::markup::{MissingAnchor, render_events, splice_document};
use crate::schedule::{ScheduleSpec, today_in};
use crate::sections::{Sections, joined, update_sections};
use crate::service::{
    Campaign, CampaignContent, CampaignSettings, ContentUpdate, EmailService, EventSource,
    NewCampaign, TemplateContent,
};
use crate::verify::verify_published;

/// How the new content is pushed to the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// Splice the previous campaign's full HTML.
    #[default]
    Html,
    /// Rewrite template sections; falls back to `Html` when the source has none.
    Sections,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub mode: ContentMode,
    pub now: DateTime<Utc>,
}

impl RunOptions {
    pub fn new(dry_run: bool, mode: ContentMode) -> Self {
        RunOptions {
            dry_run,
            mode,
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The service has no sent campaigns to start from.
    NoCampaigns,
    /// The latest campaign has no HTML.
    NoContent { source_id: String },
    /// Nothing upcoming in the spreadsheet; no campaign was created.
    NoUpcomingEvents { source_id: String },
    DryRun {
        source_id: String,
        header_label: String,
        proposed: PathBuf,
        events: usize,
        warnings: Vec<MissingAnchor>,
    },
    Scheduled {
        campaign_id: String,
        header_label: String,
        schedule_time: String,
        proposed: PathBuf,
        events: usize,
    },
}

/// New content ready to push, in the shape the chosen mode needs.
enum Prepared {
    Html {
        html: String,
        failure: Option<MissingAnchor>,
    },
    Sections {
        template_id: Option<u64>,
        sections: Sections,
    },
}

impl Prepared {
    fn document(&self) -> String {
        match self {
            Prepared::Html { html, .. } => html.clone(),
            Prepared::Sections { sections, .. } => joined(sections),
        }
    }

    fn into_update(self) -> NewsletterResult<ContentUpdate> {
        match self {
            Prepared::Html {
                failure: Some(missing),
                ..
            } => Err(NewsletterError::EventsNotUpdated(missing)),
            Prepared::Html { html, failure: None } => Ok(ContentUpdate::Html(html)),
            Prepared::Sections {
                template_id,
                sections,
            } => Ok(ContentUpdate::Template(TemplateContent {
                id: template_id,
                sections,
            })),
        }
    }
}

/// Run the newsletter automation once.
pub async fn run<S, E>(
    service: &S,
    source: &E,
    config: &NewsletterConfig,
    artifacts: &Artifacts,
    opts: &RunOptions,
) -> NewsletterResult<RunOutcome>
where
    S: EmailService,
    E: EventSource,
{
    let tz = config.timezone()?;
    let spec = ScheduleSpec::for_tomorrow(opts.now, tz, config.schedule.send_hour)?;
    log::info!(
        "Preparing newsletter for {} (send at {})",
        spec.header_label,
        spec.schedule_time
    );

    let Some(latest) = service.latest_campaign().await? else {
        log::warn!("No sent campaigns found");
        return Ok(RunOutcome::NoCampaigns);
    };
    let source_id = latest.id.clone();
    log::info!("Using campaign {source_id} as the starting point");

    let source_campaign = service.campaign(&source_id).await?;
    let content = service.content(&source_id).await?;

    let mode = match opts.mode {
        ContentMode::Sections if content.sections().is_none() => {
            log::info!("Campaign {source_id} has no template sections, using HTML");
            ContentMode::Html
        }
        mode => mode,
    };

    if mode == ContentMode::Html && content.html().trim().is_empty() {
        log::warn!("Campaign {source_id} has no HTML content");
        return Ok(RunOutcome::NoContent { source_id });
    }

    let mut table = source.fetch_table().await?;
    table.truncate(config.spreadsheet.max_rows);
    let events = upcoming_events(&table, today_in(opts.now, tz));
    log::info!("Found {} upcoming event(s)", events.len());

    if events.is_empty() {
        log::warn!("No upcoming events; nothing to schedule");
        return Ok(RunOutcome::NoUpcomingEvents { source_id });
    }

    let (prepared, warnings) = prepare(&content, mode, &spec, &events, config)?;

    let stamp = opts.now.format("%Y%m%d_%H%M%S");
    let proposed = artifacts.write(
        &format!("proposed_{}_{stamp}.html", safe_name(&source_id)),
        &prepared.document(),
    )?;
    log::info!("Proposed newsletter written to {}", proposed.display());

    if opts.dry_run {
        log::info!("Dry run: no campaign created");
        return Ok(RunOutcome::DryRun {
            source_id,
            header_label: spec.header_label,
            proposed,
            events: events.len(),
            warnings,
        });
    }

    let update = prepared.into_update()?;

    let list_id = source_campaign
        .recipients
        .list_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| NewsletterError::MissingListId(source_id.clone()))?;
    let settings = campaign_settings(&source_campaign, &spec, config);

    let created = service
        .create_campaign(&NewCampaign::regular(list_id, settings.clone()))
        .await?;
    let campaign_id = created.id;
    log::info!("Created campaign {campaign_id}");

    service.update_settings(&campaign_id, &settings).await?;
    service.set_content(&campaign_id, &update).await?;

    let published = service.content(&campaign_id).await?;
    let published_doc = published_document(&published, mode, &campaign_id, artifacts)?;

    if let Err(failure) = verify_published(&published_doc, &spec.header_label, &config.template) {
        let path = artifacts.write(
            &format!("verify_failed_{}.html", safe_name(&campaign_id)),
            &published_doc,
        )?;
        log::error!(
            "Verification failed, campaign {campaign_id} left unscheduled. Server copy at {}",
            path.display()
        );
        return Err(NewsletterError::Verification {
            campaign_id,
            failure,
        });
    }

    artifacts.write(
        &format!("final_before_schedule_{}.html", safe_name(&campaign_id)),
        &published_doc,
    )?;

    service.schedule(&campaign_id, &spec.schedule_time).await?;
    log::info!("Scheduled campaign {campaign_id} for {}", spec.schedule_time);

    Ok(RunOutcome::Scheduled {
        campaign_id,
        header_label: spec.header_label,
        schedule_time: spec.schedule_time,
        proposed,
        events: events.len(),
    })
}

fn prepare(
    content: &CampaignContent,
    mode: ContentMode,
    spec: &ScheduleSpec,
    events: &[EventRecord],
    config: &NewsletterConfig,
) -> NewsletterResult<(Prepared, Vec<MissingAnchor>)> {
    match (mode, content.sections()) {
        (ContentMode::Sections, Some(template)) => {
            let events_html = render_events(events);
            let update = update_sections(
                &template.sections,
                &spec.header_label,
                &events_html,
                &config.template,
            )?;
            log::info!(
                "Updating header section {:?} and event sections {:?}",
                update.header_key,
                update.event_keys
            );
            Ok((
                Prepared::Sections {
                    template_id: template.id,
                    sections: update.sections,
                },
                Vec::new(),
            ))
        }
        _ => {
            let report = splice_document(
                content.html(),
                &spec.header_label,
                events,
                &config.template,
            );
            for warning in &report.warnings {
                log::warn!("Splice: {warning}");
            }
            Ok((
                Prepared::Html {
                    failure: report.events_failure(),
                    html: report.html,
                },
                report.warnings,
            ))
        }
    }
}

/// Settings for the new campaign, copied from the source where it has them.
fn campaign_settings(
    source: &Campaign,
    spec: &ScheduleSpec,
    config: &NewsletterConfig,
) -> CampaignSettings {
    let from = &source.settings;
    CampaignSettings {
        title: Some(spec.campaign_title(&config.campaign.title_prefix)),
        subject_line: Some(spec.campaign_title(&config.campaign.subject_prefix)),
        from_name: Some(non_blank(&from.from_name, &config.campaign.fallback_from_name)),
        reply_to: Some(non_blank(&from.reply_to, &config.campaign.fallback_reply_to)),
        to_name: from.to_name.clone(),
        folder_id: from.folder_id.clone(),
    }
}

/// The source value unless it is missing or blank.
fn non_blank(value: &Option<String>, fallback: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Content read back after the push, as one document for verification.
fn published_document(
    published: &CampaignContent,
    mode: ContentMode,
    campaign_id: &str,
    artifacts: &Artifacts,
) -> NewsletterResult<String> {
    if mode == ContentMode::Sections {
        if let Some(template) = published.sections() {
            let doc = joined(&template.sections);
            artifacts.write(
                &format!("sections_after_{}.html", safe_name(campaign_id)),
                &doc,
            )?;
            return Ok(doc);
        }
    }
    Ok(published.html().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::Recipients;
    use crate::table::{Cell, Table};
    use crate::verify::VerificationFailure;
    use chrono::TimeZone;
    use indoc::indoc;
    use std::sync::Mutex;

    const SOURCE: &str = indoc! {r#"
        <table id="templateHeader"><tr><td>
          <span style="font-size:24px">March 1st, 2024</span>
        </td></tr></table>
        <table id="templateBody"><tr><td>
        <table class="mcnDividerBlock"><tr><td></td></tr></table>
        <p>Welcome back</p>
        <table class="mcnDividerBlock"><tr><td></td></tr></table>
        <p>Old event</p>
        <table class="mcnDividerBlock"><tr><td></td></tr></table>
        <h2>Access Support with Mantra Health</h2>
        </td></tr></table>
    "#};

    /// Email service double that records every call and echoes pushed content back.
    struct FakeService {
        latest: Option<Campaign>,
        content: CampaignContent,
        /// Replaces whatever was pushed when reading back the new campaign.
        readback: Option<CampaignContent>,
        pushed: Mutex<Option<ContentUpdate>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn with_html(html: &str) -> Self {
            FakeService {
                latest: Some(source_campaign()),
                content: CampaignContent {
                    html: Some(html.to_string()),
                    template: None,
                },
                readback: None,
                pushed: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn mutating_calls(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter(|c| !c.starts_with("get"))
                .collect()
        }
    }

    impl EmailService for FakeService {
        async fn latest_campaign(&self) -> NewsletterResult<Option<Campaign>> {
            self.record("get latest".into());
            Ok(self.latest.clone())
        }

        async fn campaign(&self, id: &str) -> NewsletterResult<Campaign> {
            self.record(format!("get campaign {id}"));
            Ok(source_campaign())
        }

        async fn content(&self, id: &str) -> NewsletterResult<CampaignContent> {
            self.record(format!("get content {id}"));
            if id != "new1" {
                return Ok(self.content.clone());
            }
            if let Some(readback) = &self.readback {
                return Ok(readback.clone());
            }
            Ok(match self.pushed.lock().unwrap().clone() {
                Some(ContentUpdate::Html(html)) => CampaignContent {
                    html: Some(html),
                    template: None,
                },
                Some(ContentUpdate::Template(template)) => CampaignContent {
                    html: None,
                    template: Some(template),
                },
                None => CampaignContent::default(),
            })
        }

        async fn set_content(&self, id: &str, content: &ContentUpdate) -> NewsletterResult<()> {
            self.record(format!("set content {id}"));
            *self.pushed.lock().unwrap() = Some(content.clone());
            Ok(())
        }

        async fn create_campaign(&self, campaign: &NewCampaign) -> NewsletterResult<Campaign> {
            self.record(format!(
                "create {}",
                campaign.settings.title.clone().unwrap_or_default()
            ));
            Ok(Campaign {
                id: "new1".into(),
                ..Default::default()
            })
        }

        async fn update_settings(
            &self,
            id: &str,
            settings: &CampaignSettings,
        ) -> NewsletterResult<()> {
            self.record(format!(
                "update {id} {}",
                settings.subject_line.clone().unwrap_or_default()
            ));
            Ok(())
        }

        async fn schedule(&self, id: &str, schedule_time: &str) -> NewsletterResult<()> {
            self.record(format!("schedule {id} {schedule_time}"));
            Ok(())
        }
    }

    struct FakeSheet(Table);

    impl EventSource for FakeSheet {
        async fn fetch_table(&self) -> NewsletterResult<Table> {
            Ok(self.0.clone())
        }
    }

    fn source_campaign() -> Campaign {
        Campaign {
            id: "src1".into(),
            send_time: Some("2024-02-23T14:00:00+00:00".into()),
            recipients: Recipients {
                list_id: Some("list1".into()),
            },
            settings: CampaignSettings {
                from_name: Some("GAPSA".into()),
                reply_to: Some("pr@example.com".into()),
                ..Default::default()
            },
        }
    }

    fn sheet(dates: &[&str]) -> FakeSheet {
        let headers = ["Event Title", "Date", "Location"]
            .map(String::from)
            .to_vec();
        let rows = dates
            .iter()
            .enumerate()
            .map(|(i, d)| {
                vec![
                    Cell::Text(format!("Event {i}")),
                    Cell::Text(d.to_string()),
                    Cell::Text("Houston Hall".into()),
                ]
            })
            .collect();
        FakeSheet(Table::new(headers, rows))
    }

    fn options(dry_run: bool) -> RunOptions {
        RunOptions {
            dry_run,
            mode: ContentMode::Html,
            // 10:00 in New York, March 1st
            now: Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap(),
        }
    }

    fn setup() -> (tempfile::TempDir, Artifacts, NewsletterConfig) {
        let tmp = tempfile::tempdir().unwrap();
        let artifacts = Artifacts::new(tmp.path());
        (tmp, artifacts, NewsletterConfig::default())
    }

    #[tokio::test]
    async fn schedules_new_campaign() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(SOURCE);
        let sheet = sheet(&["02/20/2024", "03/05/2024", "03/08/2024"]);

        let outcome = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap();

        let RunOutcome::Scheduled {
            campaign_id,
            schedule_time,
            events,
            proposed,
            ..
        } = outcome
        else {
            panic!("expected Scheduled, got {outcome:?}");
        };
        assert_eq!(campaign_id, "new1");
        assert_eq!(schedule_time, "2024-03-02T09:00:00-05:00");
        assert_eq!(events, 2);
        assert!(proposed.exists());

        assert_eq!(
            service.mutating_calls(),
            vec![
                "create Newsletter - March 2nd, 2024",
                "update new1 ✉️Newsletter - March 2nd, 2024",
                "set content new1",
                "schedule new1 2024-03-02T09:00:00-05:00",
            ]
        );

        let Some(ContentUpdate::Html(pushed)) = service.pushed.lock().unwrap().clone() else {
            panic!("expected html content");
        };
        assert!(pushed.contains("March 2nd, 2024"));
        assert!(pushed.contains("Event 1"));
        assert!(!pushed.contains("Event 0"));
        assert!(!pushed.contains("Old event"));
        assert!(pushed.contains("Welcome back"));

        assert!(artifacts.path("final_before_schedule_new1.html").exists());
    }

    #[tokio::test]
    async fn no_upcoming_events_creates_nothing() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(SOURCE);
        let sheet = sheet(&["02/20/2024", "03/01/2024"]);

        let outcome = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::NoUpcomingEvents { .. }));
        assert!(service.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn dry_run_writes_proposal_only() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(SOURCE);
        let sheet = sheet(&["03/05/2024"]);

        let outcome = run(&service, &sheet, &config, &artifacts, &options(true))
            .await
            .unwrap();

        let RunOutcome::DryRun {
            proposed, events, ..
        } = outcome
        else {
            panic!("expected DryRun, got {outcome:?}");
        };
        assert_eq!(events, 1);
        assert_eq!(
            proposed.file_name().unwrap().to_string_lossy(),
            "proposed_src1_20240301_150000.html"
        );
        let written = std::fs::read_to_string(&proposed).unwrap();
        assert!(written.contains("Event 0"));
        assert!(service.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn no_campaigns_and_no_content() {
        let (_tmp, artifacts, config) = setup();
        let sheet = sheet(&["03/05/2024"]);

        let mut service = FakeService::with_html(SOURCE);
        service.latest = None;
        let outcome = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::NoCampaigns));

        let service = FakeService::with_html("  ");
        let outcome = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::NoContent { source_id } if source_id == "src1"));
        assert!(service.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_events_area_aborts_before_creating() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(&SOURCE.replace("Mantra Health", "Counseling"));
        let sheet = sheet(&["03/05/2024"]);

        let err = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NewsletterError::EventsNotUpdated(MissingAnchor::MarkerPhrase)
        ));
        assert!(service.mutating_calls().is_empty());
        // The unchanged document is still written for review
        assert_eq!(std::fs::read_dir(artifacts.dir()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn missing_body_region_is_the_reported_anchor() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(&SOURCE.replace("templateBody", "main"));
        let sheet = sheet(&["03/05/2024"]);

        let err = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NewsletterError::EventsNotUpdated(MissingAnchor::BodyRegion)
        ));
        assert!(service.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn failed_verification_leaves_campaign_unscheduled() {
        let (_tmp, artifacts, config) = setup();
        let mut service = FakeService::with_html(SOURCE);
        service.readback = Some(CampaignContent {
            html: Some("<p>March 1st, 2024</p>".into()),
            template: None,
        });
        let sheet = sheet(&["03/05/2024"]);

        let err = run(&service, &sheet, &config, &artifacts, &options(false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NewsletterError::Verification {
                failure: VerificationFailure::HeaderMissing(_),
                ..
            }
        ));
        assert!(!service.calls().iter().any(|c| c.starts_with("schedule")));
        assert!(artifacts.path("verify_failed_new1.html").exists());
    }

    #[tokio::test]
    async fn sections_mode_pushes_template() {
        let (_tmp, artifacts, config) = setup();
        let mut service = FakeService::with_html("");
        let sections: Sections = [
            ("header", "<span>March 1st, 2024</span>"),
            ("events", r#"<table class="mcnCaptionBlock">old</table>"#),
            ("mantra", "<h2>Access Support with Mantra Health</h2>"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        service.content.template = Some(TemplateContent {
            id: Some(42),
            sections,
        });
        let sheet = sheet(&["03/05/2024"]);
        let opts = RunOptions {
            mode: ContentMode::Sections,
            ..options(false)
        };

        let outcome = run(&service, &sheet, &config, &artifacts, &opts)
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Scheduled { .. }));

        let Some(ContentUpdate::Template(template)) = service.pushed.lock().unwrap().clone()
        else {
            panic!("expected template content");
        };
        assert_eq!(template.id, Some(42));
        assert_eq!(template.sections["header"], "<span>March 2nd, 2024</span>");
        assert!(template.sections["events"].contains("Event 0"));
        assert!(artifacts.path("sections_after_new1.html").exists());
    }

    #[tokio::test]
    async fn sections_mode_falls_back_to_html() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(SOURCE);
        let sheet = sheet(&["03/05/2024"]);
        let opts = RunOptions {
            mode: ContentMode::Sections,
            ..options(false)
        };

        run(&service, &sheet, &config, &artifacts, &opts).await.unwrap();
        assert!(matches!(
            service.pushed.lock().unwrap().clone(),
            Some(ContentUpdate::Html(_))
        ));
    }

    #[test]
    fn blank_sender_settings_use_fallbacks() {
        let config = NewsletterConfig::default();
        let spec = ScheduleSpec::for_tomorrow(options(false).now, chrono_tz::America::New_York, 9)
            .unwrap();
        let mut source = source_campaign();
        source.settings.from_name = Some("".into());
        source.settings.reply_to = Some("   ".into());
        source.settings.folder_id = Some("f1".into());

        let settings = campaign_settings(&source, &spec, &config);

        assert_eq!(settings.from_name.as_deref(), Some("Newsletter"));
        assert_eq!(settings.reply_to.as_deref(), Some("no-reply@example.com"));
        assert_eq!(settings.folder_id.as_deref(), Some("f1"));
        assert_eq!(settings.title.as_deref(), Some("Newsletter - March 2nd, 2024"));

        let settings = campaign_settings(&source_campaign(), &spec, &config);
        assert_eq!(settings.from_name.as_deref(), Some("GAPSA"));
        assert_eq!(settings.reply_to.as_deref(), Some("pr@example.com"));
    }

    /// 30 past rows followed by 5 upcoming ones.
    fn late_upcoming_sheet() -> FakeSheet {
        let mut dates = vec!["02/20/2024"; 30];
        dates.extend(["03/05/2024"; 5]);
        sheet(&dates)
    }

    #[tokio::test]
    async fn rows_past_the_limit_are_ignored() {
        let (_tmp, artifacts, config) = setup();
        let service = FakeService::with_html(SOURCE);

        let outcome = run(&service, &late_upcoming_sheet(), &config, &artifacts, &options(false))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::NoUpcomingEvents { .. }));
        assert!(service.mutating_calls().is_empty());
    }

    #[tokio::test]
    async fn max_rows_moves_the_cutoff() {
        let (_tmp, artifacts, mut config) = setup();
        config.spreadsheet.max_rows = 32;
        let service = FakeService::with_html(SOURCE);

        let outcome = run(&service, &late_upcoming_sheet(), &config, &artifacts, &options(true))
            .await
            .unwrap();

        let RunOutcome::DryRun { events, .. } = outcome else {
            panic!("expected DryRun, got {outcome:?}");
        };
        assert_eq!(events, 2);
    }
}
