//! Newsletter configuration.
//!
//! Read from `~/.config/newsletter/config.toml`, with the Mailchimp credentials
//! and the spreadsheet link overridable from the environment.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, File};
use serde::Deserialize;

use crate::error::{NewsletterError, NewsletterResult};
use crate::markers::TemplateMarkers;

const DEFAULT_SERVER_PREFIX: &str = "us6";
const DEFAULT_TIMEZONE: &str = "America/New_York";
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailchimpConfig {
    pub api_key: Option<String>,
    pub server_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    /// Direct-download link to the events workbook.
    pub url: Option<String>,
    /// Data rows read from the top of the first sheet.
    pub max_rows: usize,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        SpreadsheetConfig {
            url: None,
            max_rows: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub timezone: String,
    /// Local hour of day the campaign is sent.
    pub send_hour: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            timezone: DEFAULT_TIMEZONE.to_string(),
            send_hour: 9,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub title_prefix: String,
    pub subject_prefix: String,
    /// Used when the source campaign has no sender name.
    pub fallback_from_name: String,
    /// Used when the source campaign has no reply-to address.
    pub fallback_reply_to: String,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        CampaignConfig {
            title_prefix: "Newsletter".to_string(),
            subject_prefix: "✉️Newsletter".to_string(),
            fallback_from_name: "Newsletter".to_string(),
            fallback_reply_to: "no-reply@example.com".to_string(),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterConfig {
    #[serde(default)]
    pub mailchimp: MailchimpConfig,

    #[serde(default)]
    pub spreadsheet: SpreadsheetConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub campaign: CampaignConfig,

    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    #[serde(default)]
    pub template: TemplateMarkers,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        NewsletterConfig {
            mailchimp: MailchimpConfig::default(),
            spreadsheet: SpreadsheetConfig::default(),
            schedule: ScheduleConfig::default(),
            campaign: CampaignConfig::default(),
            artifacts_dir: default_artifacts_dir(),
            template: TemplateMarkers::default(),
        }
    }
}

/// Values taken from the environment, applied over the config file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub server_prefix: Option<String>,
    pub sheet_url: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        EnvOverrides {
            api_key: var("MAILCHIMP_API_KEY"),
            server_prefix: var("MAILCHIMP_SERVER_PREFIX"),
            sheet_url: var("NEWSLETTER_SHEET_URL"),
        }
    }
}

impl NewsletterConfig {
    pub fn config_path() -> NewsletterResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NewsletterError::Config("Could not determine config directory".into()))?
            .join("newsletter");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the user config, creating a commented-out default on first use.
    pub fn load() -> NewsletterResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path, &EnvOverrides::from_env())
    }

    pub fn load_from(path: &Path, env: &EnvOverrides) -> NewsletterResult<Self> {
        let config_err = |e: config::ConfigError| NewsletterError::Config(e.to_string());

        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_override_option("mailchimp.api_key", env.api_key.clone())
            .map_err(config_err)?
            .set_override_option("mailchimp.server_prefix", env.server_prefix.clone())
            .map_err(config_err)?
            .set_override_option("spreadsheet.url", env.sheet_url.clone())
            .map_err(config_err)?
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)
    }

    pub fn api_key(&self) -> NewsletterResult<&str> {
        self.mailchimp
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                NewsletterError::Config(
                    "No Mailchimp API key. Set MAILCHIMP_API_KEY or [mailchimp] api_key".into(),
                )
            })
    }

    /// Data center prefix: explicit value, else the API key's `-usN` suffix, else `us6`.
    pub fn server_prefix(&self) -> String {
        if let Some(prefix) = self.mailchimp.server_prefix.as_deref().filter(|p| !p.is_empty()) {
            return prefix.to_string();
        }

        self.mailchimp
            .api_key
            .as_deref()
            .and_then(|key| key.rsplit_once('-'))
            .map(|(_, dc)| dc.to_string())
            .filter(|dc| !dc.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_PREFIX.to_string())
    }

    pub fn timezone(&self) -> NewsletterResult<Tz> {
        self.schedule.timezone.parse::<Tz>().map_err(|e| {
            NewsletterError::Config(format!("Invalid timezone '{}': {e}", self.schedule.timezone))
        })
    }

    pub fn sheet_url(&self) -> NewsletterResult<&str> {
        self.spreadsheet
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                NewsletterError::Config(
                    "No spreadsheet link. Pass --sheet-url, set NEWSLETTER_SHEET_URL or [spreadsheet] url"
                        .into(),
                )
            })
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.artifacts_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> NewsletterResult<()> {
        let contents = format!(
            "\
# newsletter configuration

# Where proposed and published HTML is written for review:
# artifacts_dir = \"{DEFAULT_ARTIFACTS_DIR}\"

[mailchimp]
# api_key = \"xxxxxxxx-{DEFAULT_SERVER_PREFIX}\"
# server_prefix = \"{DEFAULT_SERVER_PREFIX}\"

[spreadsheet]
# Direct download link to the events workbook:
# url = \"https://example.com/events.xlsx?download=1\"
# max_rows = 30

[schedule]
# timezone = \"{DEFAULT_TIMEZONE}\"
# send_hour = 9

[campaign]
# title_prefix = \"Newsletter\"
# subject_prefix = \"Newsletter\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NewsletterError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| NewsletterError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
