//! HTTP client for the Mailchimp Marketing API v3.

use std::time::Duration;

use newsletter_core::service::{
    Campaign, CampaignContent, CampaignSettings, ContentUpdate, EmailService, NewCampaign,
};
use newsletter_core::{NewsletterError, NewsletterResult};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Mailchimp client for one account.
pub struct MailchimpClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

// Response types matching the Mailchimp API

#[derive(Deserialize)]
struct CampaignList {
    #[serde(default)]
    campaigns: Vec<Campaign>,
}

#[derive(Deserialize)]
struct PingResponse {
    health_status: String,
}

/// Mailchimp's problem-details error body.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl MailchimpClient {
    pub fn new(server_prefix: &str, api_key: &str) -> NewsletterResult<Self> {
        Self::with_base_url(
            &format!("https://{server_prefix}.api.mailchimp.com/3.0"),
            api_key,
        )
    }

    /// Client against an explicit API root, e.g. a local mock server.
    pub fn with_base_url(base_url: &str, api_key: &str) -> NewsletterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NewsletterError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth("anystring", Some(&self.api_key))
    }

    async fn send(&self, req: RequestBuilder) -> NewsletterResult<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| NewsletterError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NewsletterError::Service {
                status,
                message: error_message(&body),
            });
        }

        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> NewsletterResult<T> {
        self.send(req)
            .await?
            .json()
            .await
            .map_err(|e| NewsletterError::Serialization(e.to_string()))
    }

    /// GET /ping
    pub async fn ping(&self) -> NewsletterResult<String> {
        let resp: PingResponse = self
            .send_json(self.request(reqwest::Method::GET, "/ping"))
            .await?;
        Ok(resp.health_status)
    }
}

/// Human-readable message from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            title: Some(title),
            detail: Some(detail),
        }) => format!("{title}: {detail}"),
        Ok(ErrorResponse {
            title: Some(message),
            detail: None,
        })
        | Ok(ErrorResponse {
            title: None,
            detail: Some(message),
        }) => message,
        _ => body.trim().to_string(),
    }
}

impl EmailService for MailchimpClient {
    /// GET /campaigns, newest send first
    async fn latest_campaign(&self) -> NewsletterResult<Option<Campaign>> {
        let req = self.request(reqwest::Method::GET, "/campaigns").query(&[
            ("sort_field", "send_time"),
            ("sort_dir", "DESC"),
            ("count", "1"),
        ]);
        let list: CampaignList = self.send_json(req).await?;
        Ok(list.campaigns.into_iter().next())
    }

    /// GET /campaigns/:id
    async fn campaign(&self, id: &str) -> NewsletterResult<Campaign> {
        self.send_json(self.request(reqwest::Method::GET, &format!("/campaigns/{id}")))
            .await
    }

    /// GET /campaigns/:id/content
    async fn content(&self, id: &str) -> NewsletterResult<CampaignContent> {
        self.send_json(self.request(reqwest::Method::GET, &format!("/campaigns/{id}/content")))
            .await
    }

    /// PUT /campaigns/:id/content
    async fn set_content(&self, id: &str, content: &ContentUpdate) -> NewsletterResult<()> {
        let req = self
            .request(reqwest::Method::PUT, &format!("/campaigns/{id}/content"))
            .json(content);
        self.send(req).await?;
        Ok(())
    }

    /// POST /campaigns
    async fn create_campaign(&self, campaign: &NewCampaign) -> NewsletterResult<Campaign> {
        let req = self
            .request(reqwest::Method::POST, "/campaigns")
            .json(campaign);
        self.send_json(req).await
    }

    /// PATCH /campaigns/:id
    async fn update_settings(&self, id: &str, settings: &CampaignSettings) -> NewsletterResult<()> {
        let req = self
            .request(reqwest::Method::PATCH, &format!("/campaigns/{id}"))
            .json(&json!({ "settings": settings }));
        self.send(req).await?;
        Ok(())
    }

    /// POST /campaigns/:id/actions/schedule
    async fn schedule(&self, id: &str, schedule_time: &str) -> NewsletterResult<()> {
        let req = self
            .request(
                reqwest::Method::POST,
                &format!("/campaigns/{id}/actions/schedule"),
            )
            .json(&json!({ "schedule_time": schedule_time }));
        self.send(req).await?;
        Ok(())
    }
}
