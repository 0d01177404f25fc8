pub mod cms;
pub mod geocoding;
pub mod mailer;
pub mod revalidate;
pub mod storage;

use std::time::Duration;

pub use cms::{Category, CmsClient, StaticTaxonomy, Tag, Taxonomy};
pub use geocoding::{GeocodingClient, Place, ReverseGeocoder};
pub use mailer::{Email, LogMailer, Mailer, ResendMailer};
pub use revalidate::{LogPageCache, PageCache, RevalidationClient};
pub use storage::{ObjectStorage, SupabaseStorage, UnconfiguredStorage};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()?)
}

pub(crate) fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

/// Error body of a non-2xx response, or the original response on success.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slashes() {
        assert_eq!(normalize_base_url("https://api.resend.com/"), "https://api.resend.com");
        assert_eq!(normalize_base_url(" https://x.io// "), "https://x.io");
        assert_eq!(normalize_base_url("https://x.io/v1"), "https://x.io/v1");
    }
}
