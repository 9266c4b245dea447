//! Collaborators the pipeline talks to: the email marketing service and the
//! spreadsheet holding upcoming events.
//!
//! Wire types follow the Mailchimp Marketing API v3 campaign resources; fields
//! the pipeline doesn't read are left out.

use serde::{Deserialize, Serialize};

use crate::error::NewsletterResult;
use crate::sections::Sections;
use crate::table::Table;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipients {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub send_time: Option<String>,
    #[serde(default)]
    pub recipients: Recipients,
    #[serde(default)]
    pub settings: CampaignSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub sections: Sections,
}

/// Campaign content as returned by the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignContent {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub template: Option<TemplateContent>,
}

impl CampaignContent {
    pub fn html(&self) -> &str {
        self.html.as_deref().unwrap_or_default()
    }

    /// Template sections, when the campaign has any.
    pub fn sections(&self) -> Option<&TemplateContent> {
        self.template.as_ref().filter(|t| !t.sections.is_empty())
    }
}

/// Body of a content update: either raw HTML or template sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentUpdate {
    Html(String),
    Template(TemplateContent),
}

/// Body of a campaign creation request.
#[derive(Debug, Clone, Serialize)]
pub struct NewCampaign {
    #[serde(rename = "type")]
    pub kind: String,
    pub recipients: Recipients,
    pub settings: CampaignSettings,
}

impl NewCampaign {
    pub fn regular(list_id: String, settings: CampaignSettings) -> Self {
        NewCampaign {
            kind: "regular".to_string(),
            recipients: Recipients {
                list_id: Some(list_id),
            },
            settings,
        }
    }
}

/// The email marketing service, as a black-box RPC API.
#[allow(async_fn_in_trait)]
pub trait EmailService {
    /// Most recently sent campaign, if there is one.
    async fn latest_campaign(&self) -> NewsletterResult<Option<Campaign>>;

    async fn campaign(&self, id: &str) -> NewsletterResult<Campaign>;

    async fn content(&self, id: &str) -> NewsletterResult<CampaignContent>;

    async fn set_content(&self, id: &str, content: &ContentUpdate) -> NewsletterResult<()>;

    async fn create_campaign(&self, campaign: &NewCampaign) -> NewsletterResult<Campaign>;

    async fn update_settings(&self, id: &str, settings: &CampaignSettings) -> NewsletterResult<()>;

    /// Schedule delivery at an RFC 3339 timestamp with UTC offset.
    async fn schedule(&self, id: &str, schedule_time: &str) -> NewsletterResult<()>;
}

/// Where upcoming events come from.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    async fn fetch_table(&self) -> NewsletterResult<Table>;
}
