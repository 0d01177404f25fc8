mod clients;
mod config;
mod database;
mod error;
mod handlers;
mod models;
mod notifications;
mod plan;
mod services;
mod slug;
mod state;
#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use crate::clients::{
    ClientError, CmsClient, GeocodingClient, LogMailer, LogPageCache, Mailer, ObjectStorage,
    PageCache, ResendMailer, ReverseGeocoder, RevalidationClient, StaticTaxonomy,
    SupabaseStorage, Taxonomy, UnconfiguredStorage,
};
use crate::config::AppConfig;
use crate::database::{BadgeApplicationStore, Database, ListingStore, MemoryStore};
use crate::notifications::Notifier;
use crate::state::AppState;

fn io_error(context: &str, err: impl std::fmt::Debug) -> std::io::Error {
    log::error!("{context}: {err:?}");
    std::io::Error::other(format!("{context}: {err:?}"))
}

async fn build_state(config: &AppConfig) -> std::io::Result<AppState> {
    let (listings, badges): (Arc<dyn ListingStore>, Arc<dyn BadgeApplicationStore>) =
        match &config.database_url {
            Some(url) => {
                let db = Database::connect(url)
                    .await
                    .map_err(|err| io_error("Failed to initialize database", err))?;
                log::info!("Connected to Postgres, migrations applied");
                (Arc::new(db.clone()), Arc::new(db))
            }
            None => {
                log::warn!("DATABASE_URL not set, using in-memory store (data is not persisted)");
                let store = MemoryStore::new();
                (Arc::new(store.clone()), Arc::new(store))
            }
        };

    let clients =
        build_clients(config).map_err(|err| io_error("Failed to build HTTP clients", err))?;

    Ok(AppState {
        listings,
        badges,
        notifier: Notifier::new(
            clients.mailer,
            config.site_url.clone(),
            config.mail.admin_email.clone(),
        ),
        pages: clients.pages,
        storage: clients.storage,
        taxonomy: clients.taxonomy,
        geocoder: clients.geocoder,
    })
}

struct Clients {
    mailer: Arc<dyn Mailer>,
    pages: Arc<dyn PageCache>,
    storage: Arc<dyn ObjectStorage>,
    taxonomy: Arc<dyn Taxonomy>,
    geocoder: Arc<dyn ReverseGeocoder>,
}

fn build_clients(config: &AppConfig) -> Result<Clients, ClientError> {
    let timeout = config.http_timeout;

    let mailer: Arc<dyn Mailer> = match &config.mail.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone(), config.mail.from.clone(), timeout)?),
        None => {
            log::warn!("RESEND_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let pages: Arc<dyn PageCache> = match &config.revalidate {
        Some(cfg) => Arc::new(RevalidationClient::new(&cfg.url, cfg.secret.clone(), timeout)?),
        None => Arc::new(LogPageCache),
    };

    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        Some(cfg) => Arc::new(SupabaseStorage::new(
            &cfg.url,
            cfg.service_key.clone(),
            cfg.bucket.clone(),
            timeout,
        )?),
        None => {
            log::warn!("Object storage not configured, document uploads are disabled");
            Arc::new(UnconfiguredStorage)
        }
    };

    let taxonomy: Arc<dyn Taxonomy> = match &config.cms {
        Some(cfg) => Arc::new(CmsClient::new(
            &cfg.project_id,
            cfg.dataset.clone(),
            &cfg.api_version,
            timeout,
        )?),
        None => Arc::new(StaticTaxonomy::default()),
    };

    Ok(Clients {
        mailer,
        pages,
        storage,
        taxonomy,
        geocoder: Arc::new(GeocodingClient::new(&config.geocoder_url, timeout)?),
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| io_error("Invalid configuration", err))?;
    let bind_address = config.bind_address();

    let state = web::Data::new(build_state(&config).await?);

    log::info!(
        "🚀 Starting Child Actor Directory Service on {}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
