use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;

use super::{failure, optional_actor, require_actor};
use crate::models::{ApiResponse, SubmitListingRequest};
use crate::services::submission;
use crate::state::AppState;

#[post("/submit")]
pub async fn submit_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<SubmitListingRequest>,
) -> impl Responder {
    let body = payload.into_inner();
    let is_edit = body.is_edit;
    let actor = optional_actor(&req);

    match submission::submit_listing(&state, actor.as_ref(), body).await {
        Ok(outcome) if is_edit => HttpResponse::Ok().json(ApiResponse::success(outcome)),
        Ok(outcome) => HttpResponse::Created().json(ApiResponse::success(outcome)),
        Err(err) if is_edit => failure(err, "Failed to update listing"),
        Err(err) => failure(err, "Failed to submit listing"),
    }
}

#[get("/dashboard/vendor/listings")]
pub async fn vendor_listings(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match submission::vendor_listings(&state, &actor).await {
        Ok(listings) => HttpResponse::Ok().json(ApiResponse::success(listings)),
        Err(err) => failure(err, "Failed to list listings"),
    }
}

#[post("/listings/{listing_id}/claim")]
pub async fn claim_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
) -> impl Responder {
    let actor = match require_actor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match submission::claim_listing(&state, &actor, listing_id.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to claim listing"),
    }
}
