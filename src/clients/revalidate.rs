use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{ensure_success, http_client, normalize_base_url, ClientError};

/// Invalidates rendered pages on the frontend after data changes.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn revalidate(&self, paths: &[String]) -> Result<(), ClientError>;
}

#[derive(Debug, Serialize)]
struct RevalidateRequest<'a> {
    paths: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    secret: Option<&'a str>,
}

/// Calls the frontend's on-demand revalidation hook.
#[derive(Clone)]
pub struct RevalidationClient {
    client: reqwest::Client,
    url: String,
    secret: Option<String>,
}

impl RevalidationClient {
    pub fn new(url: &str, secret: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            url: normalize_base_url(url),
            secret,
        })
    }
}

#[async_trait]
impl PageCache for RevalidationClient {
    async fn revalidate(&self, paths: &[String]) -> Result<(), ClientError> {
        if paths.is_empty() {
            return Ok(());
        }

        let payload = RevalidateRequest {
            paths,
            secret: self.secret.as_deref(),
        };
        let response = self.client.post(&self.url).json(&payload).send().await?;
        ensure_success(response).await?;

        log::debug!("Revalidated {} page(s)", paths.len());
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogPageCache;

#[async_trait]
impl PageCache for LogPageCache {
    async fn revalidate(&self, paths: &[String]) -> Result<(), ClientError> {
        log::debug!("Page revalidation disabled, skipping {paths:?}");
        Ok(())
    }
}
