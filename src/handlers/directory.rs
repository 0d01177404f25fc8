use actix_web::{get, web, HttpRequest, HttpResponse, Responder};

use super::{failure, optional_actor};
use crate::models::{ApiResponse, DirectoryQuery, GeocodeQuery};
use crate::plan::Viewer;
use crate::services::directory as service;
use crate::state::AppState;

#[get("/directory")]
pub async fn directory(
    state: web::Data<AppState>,
    query: web::Query<DirectoryQuery>,
) -> impl Responder {
    match service::directory(&state, &query).await {
        Ok(listings) => HttpResponse::Ok().json(ApiResponse::success(listings)),
        Err(err) => failure(err, "Failed to load directory"),
    }
}

#[get("/category/{slug}")]
pub async fn category_page(state: web::Data<AppState>, slug: web::Path<String>) -> impl Responder {
    match service::category_page(&state, &slug).await {
        Ok(page) => HttpResponse::Ok().json(ApiResponse::success(page)),
        Err(err) => failure(err, "Failed to load category"),
    }
}

#[get("/listing/{slug}")]
pub async fn listing_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> impl Responder {
    let viewer = match optional_actor(&req) {
        Some(actor) if actor.is_admin() => Viewer::Admin,
        _ => Viewer::Public,
    };

    match service::listing_by_slug(&state, &slug, viewer).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to load listing"),
    }
}

#[get("/categories")]
pub async fn categories(state: web::Data<AppState>) -> impl Responder {
    match service::categories(&state).await {
        Ok(categories) => HttpResponse::Ok().json(ApiResponse::success(categories)),
        Err(err) => failure(err, "Failed to load categories"),
    }
}

#[get("/tags")]
pub async fn tags(state: web::Data<AppState>) -> impl Responder {
    match service::tags(&state).await {
        Ok(tags) => HttpResponse::Ok().json(ApiResponse::success(tags)),
        Err(err) => failure(err, "Failed to load tags"),
    }
}

#[get("/geocode/reverse")]
pub async fn reverse_geocode(
    state: web::Data<AppState>,
    query: web::Query<GeocodeQuery>,
) -> impl Responder {
    match service::reverse_geocode(&state, query.lat, query.lon).await {
        Ok(place) => HttpResponse::Ok().json(ApiResponse::success(place)),
        Err(err) => failure(err, "Failed to resolve location"),
    }
}
