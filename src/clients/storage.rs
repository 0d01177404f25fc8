use std::time::Duration;

use async_trait::async_trait;

use super::{ensure_success, http_client, normalize_base_url, ClientError};

/// Blob storage for uploaded badge documents.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under `path` and returns the public URL.
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError>;
}

/// Supabase Storage REST API
#[derive(Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(
        base_url: &str,
        service_key: String,
        bucket: String,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: normalize_base_url(base_url),
            service_key,
            bucket,
        })
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(self.public_url(path))
    }
}

/// Placeholder used when no storage backend is configured.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredStorage;

#[async_trait]
impl ObjectStorage for UnconfiguredStorage {
    async fn upload(&self, _: &str, _: &str, _: Vec<u8>) -> Result<String, ClientError> {
        Err(ClientError::NotConfigured("object storage"))
    }
}
