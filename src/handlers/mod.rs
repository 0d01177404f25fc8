pub mod admin;
pub mod badges;
pub mod directory;
pub mod listings;

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::ApiResponse;
use crate::services::badges::MAX_DOCUMENT_BYTES;
use crate::services::{Actor, ActorRole};

/// Registers every route under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::PayloadConfig::new(MAX_DOCUMENT_BYTES + 64 * 1024))
            .service(health_check)
            .service(listings::submit_listing)
            .service(listings::vendor_listings)
            .service(listings::claim_listing)
            .service(directory::directory)
            .service(directory::category_page)
            .service(directory::listing_page)
            .service(directory::categories)
            .service(directory::tags)
            .service(directory::reverse_geocode)
            .service(admin::list_listings)
            .service(admin::create_listing)
            .service(admin::overview)
            .service(admin::update_listing)
            .service(admin::delete_listing)
            .service(admin::approve_listing)
            .service(admin::reject_listing)
            .service(admin::set_comped)
            .service(badges::get_application)
            .service(badges::save_draft)
            .service(badges::submit_application)
            .service(badges::upload_document)
            .service(badges::remove_document)
            .service(badges::list_applications)
            .service(badges::approve_application)
            .service(badges::reject_application),
    );
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn extract_actor(req: &HttpRequest) -> Result<Actor, String> {
    let id = header(req, "X-Actor-Id")
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| "Missing or invalid X-Actor-Id header".to_string())?;

    let role = match header(req, "X-Actor-Role") {
        Some(role) => role.parse::<ActorRole>()?,
        None => ActorRole::Vendor,
    };

    Ok(Actor {
        id,
        role,
        email: header(req, "X-Actor-Email").map(str::to_string),
    })
}

/// Actor when the headers are present and valid.
pub(crate) fn optional_actor(req: &HttpRequest) -> Option<Actor> {
    extract_actor(req).ok()
}

pub(crate) fn require_actor(req: &HttpRequest) -> Result<Actor, HttpResponse> {
    extract_actor(req)
        .map_err(|message| HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)))
}

pub(crate) fn require_admin(req: &HttpRequest) -> Result<Actor, HttpResponse> {
    let actor = require_actor(req)?;
    if !actor.is_admin() {
        return Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Admin access required".into())));
    }
    Ok(actor)
}

pub(crate) fn require_vendor(req: &HttpRequest) -> Result<Actor, HttpResponse> {
    let actor = require_actor(req)?;
    if actor.role != ActorRole::Vendor {
        return Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Vendor access required".into())));
    }
    Ok(actor)
}

/// Maps a workflow error to a response. Server-side failures are logged and
/// replaced by `context`.
pub(crate) fn failure(err: ServiceError, context: &str) -> HttpResponse {
    let status = err.status_code();
    let message = if err.is_client_facing() {
        err.to_string()
    } else {
        log::error!("{context}: {err:?}");
        context.to_string()
    };
    HttpResponse::build(status).json(ApiResponse::<()>::error(message))
}

// ============================================================================
// HEALTH CHECK
// ============================================================================

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "childactor-directory-service",
        "timestamp": chrono::Utc::now()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn actor_headers_parse() {
        let id = Uuid::new_v4();
        let req = TestRequest::default()
            .insert_header(("X-Actor-Id", id.to_string()))
            .insert_header(("X-Actor-Role", "Admin"))
            .insert_header(("X-Actor-Email", "ops@example.com"))
            .to_http_request();

        let actor = extract_actor(&req).unwrap();
        assert_eq!(actor.id, id);
        assert!(actor.is_admin());
        assert_eq!(actor.email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn missing_or_bad_actor_headers() {
        let req = TestRequest::default().to_http_request();
        assert!(extract_actor(&req).is_err());
        assert!(optional_actor(&req).is_none());

        let req = TestRequest::default()
            .insert_header(("X-Actor-Id", Uuid::new_v4().to_string()))
            .insert_header(("X-Actor-Role", "superuser"))
            .to_http_request();
        assert!(extract_actor(&req).is_err());

        let req = TestRequest::default()
            .insert_header(("X-Actor-Id", Uuid::new_v4().to_string()))
            .to_http_request();
        assert_eq!(extract_actor(&req).unwrap().role, ActorRole::Vendor);
        assert_eq!(
            require_admin(&req).unwrap_err().status(),
            actix_web::http::StatusCode::FORBIDDEN
        );
    }
}
