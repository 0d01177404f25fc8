use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{ensure_success, http_client, normalize_base_url, ClientError};

const RESEND_API_URL: &str = "https://api.resend.com";

/// Outgoing transactional email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), ClientError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Resend HTTP API
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, timeout: Duration) -> Result<Self, ClientError> {
        Self::with_base_url(RESEND_API_URL, api_key, from, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        from: String,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: normalize_base_url(base_url),
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), ClientError> {
        let url = format!("{}/emails", self.base_url);
        let payload = SendEmailRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        ensure_success(response).await?;

        log::debug!("Sent email '{}' to {:?}", email.subject, email.to);
        Ok(())
    }
}

/// Mailer for environments without an API key; logs instead of sending.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), ClientError> {
        log::info!(
            "Email delivery disabled, would send '{}' to {:?}",
            email.subject,
            email.to
        );
        Ok(())
    }
}
