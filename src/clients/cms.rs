use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{ensure_success, http_client, normalize_base_url, ClientError};

const CATEGORY_LIST_QUERY: &str = r#"*[_type == "category" && defined(slug.current)] | order(order desc) { name, "slug": slug.current, description }"#;
const CATEGORY_QUERY: &str = r#"*[_type == "category" && slug.current == $slug][0] { name, "slug": slug.current, description }"#;
const TAG_LIST_QUERY: &str = r#"*[_type == "tag" && defined(slug.current)] | order(slug.current asc) { name, "slug": slug.current }"#;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub slug: String,
}

/// Read-only editorial taxonomy.
#[async_trait]
pub trait Taxonomy: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, ClientError>;
    async fn category(&self, slug: &str) -> Result<Option<Category>, ClientError>;
    async fn tags(&self) -> Result<Vec<Tag>, ClientError>;
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Sanity HTTP query API
#[derive(Clone)]
pub struct CmsClient {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
}

impl CmsClient {
    pub fn new(
        project_id: &str,
        dataset: String,
        api_version: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = format!("https://{project_id}.apicdn.sanity.io/v{api_version}");
        Self::with_base_url(&base_url, dataset, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        dataset: String,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: normalize_base_url(base_url),
            dataset,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}/data/query/{}", self.base_url, self.dataset);

        let mut query: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            let encoded = serde_json::to_string(value)
                .map_err(|err| ClientError::InvalidResponse(err.to_string()))?;
            query.push((format!("${name}"), encoded));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let response = ensure_success(response).await?;
        let body: QueryResponse<T> = response.json().await?;
        Ok(body.result)
    }
}

#[async_trait]
impl Taxonomy for CmsClient {
    async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        self.query(CATEGORY_LIST_QUERY, &[]).await
    }

    async fn category(&self, slug: &str) -> Result<Option<Category>, ClientError> {
        self.query(CATEGORY_QUERY, &[("slug", slug.to_string())]).await
    }

    async fn tags(&self) -> Result<Vec<Tag>, ClientError> {
        self.query(TAG_LIST_QUERY, &[]).await
    }
}

/// Fixed taxonomy; empty when no CMS project is configured.
#[derive(Debug, Default, Clone)]
pub struct StaticTaxonomy {
    categories: Vec<Category>,
    tags: Vec<Tag>,
}

impl StaticTaxonomy {
    pub fn new(categories: Vec<Category>, tags: Vec<Tag>) -> Self {
        Self { categories, tags }
    }
}

#[async_trait]
impl Taxonomy for StaticTaxonomy {
    async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        Ok(self.categories.clone())
    }

    async fn category(&self, slug: &str) -> Result<Option<Category>, ClientError> {
        Ok(self.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn tags(&self) -> Result<Vec<Tag>, ClientError> {
        Ok(self.tags.clone())
    }
}
