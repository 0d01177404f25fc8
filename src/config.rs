use std::env;
use std::time::Duration;

const DEFAULT_SITE_URL: &str = "https://directory.childactor101.com";
const DEFAULT_MAIL_FROM: &str = "Child Actor 101 Directory <noreply@childactor101.com>";
const DEFAULT_ADMIN_EMAIL: &str = "admin@childactor101.com";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Top-level configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub site_url: String,
    pub http_timeout: Duration,
    pub mail: MailConfig,
    pub revalidate: Option<RevalidateConfig>,
    pub cms: Option<CmsConfig>,
    pub storage: Option<StorageConfig>,
    pub geocoder_url: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub from: String,
    pub admin_email: String,
}

#[derive(Debug, Clone)]
pub struct RevalidateConfig {
    pub url: String,
    pub secret: Option<String>,
}

/// Sanity project holding the editorial taxonomy.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("HTTP_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("{0} must be an absolute http(s) URL")]
    InvalidUrl(&'static str),
    #[error("{0} is set but {1} is missing")]
    Incomplete(&'static str, &'static str),
}

fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn url_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match var(name) {
        Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            Err(ConfigError::InvalidUrl(name))
        }
        other => Ok(other),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("PORT")
            .unwrap_or_else(|| "8082".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let http_timeout = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout),
            },
            None => Duration::from_secs(10),
        };

        let site_url = url_var("SITE_URL")?
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let mail = MailConfig {
            resend_api_key: var("RESEND_API_KEY"),
            from: var("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            admin_email: var("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        };

        let revalidate = url_var("REVALIDATE_URL")?.map(|url| RevalidateConfig {
            url,
            secret: var("REVALIDATE_SECRET"),
        });

        let cms = var("SANITY_PROJECT_ID").map(|project_id| CmsConfig {
            project_id,
            dataset: var("SANITY_DATASET").unwrap_or_else(|| "production".to_string()),
            api_version: var("SANITY_API_VERSION").unwrap_or_else(|| "2023-05-03".to_string()),
        });

        let storage = match (url_var("SUPABASE_URL")?, var("SUPABASE_SERVICE_KEY")) {
            (Some(url), Some(service_key)) => Some(StorageConfig {
                url,
                service_key,
                bucket: var("STORAGE_BUCKET").unwrap_or_else(|| "badge_docs".to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete("SUPABASE_URL", "SUPABASE_SERVICE_KEY"))
            }
            _ => None,
        };

        let geocoder_url =
            url_var("GEOCODER_URL")?.unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string());

        Ok(Self {
            host,
            port,
            database_url: var("DATABASE_URL"),
            site_url,
            http_timeout,
            mail,
            revalidate,
            cms,
            storage,
            geocoder_url,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
