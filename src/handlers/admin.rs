use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use uuid::Uuid;

use super::{failure, require_admin};
use crate::models::{
    AdminCreateListingRequest, AdminListingsQuery, AdminUpdateListingRequest, ApiResponse,
    CompedRequest,
};
use crate::services::moderation;
use crate::state::AppState;

macro_rules! admin_or_return {
    ($req:expr) => {
        match require_admin(&$req) {
            Ok(actor) => actor,
            Err(response) => return response,
        }
    };
}

#[get("/dashboard/admin/listings")]
pub async fn list_listings(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<AdminListingsQuery>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::admin_listings(&state, &query).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to list listings"),
    }
}

#[post("/dashboard/admin/listings")]
pub async fn create_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<AdminCreateListingRequest>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::admin_create(&state, payload.into_inner()).await {
        Ok(listing) => HttpResponse::Created().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to create listing"),
    }
}

#[get("/dashboard/admin/overview")]
pub async fn overview(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    admin_or_return!(req);

    match moderation::dashboard_overview(&state).await {
        Ok(overview) => HttpResponse::Ok().json(ApiResponse::success(overview)),
        Err(err) => failure(err, "Failed to load overview"),
    }
}

#[put("/dashboard/admin/listings/{listing_id}")]
pub async fn update_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
    payload: web::Json<AdminUpdateListingRequest>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::admin_update(&state, listing_id.into_inner(), payload.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to update listing"),
    }
}

#[delete("/dashboard/admin/listings/{listing_id}")]
pub async fn delete_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::delete(&state, listing_id.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => failure(err, "Failed to delete listing"),
    }
}

#[post("/dashboard/admin/listings/{listing_id}/approve")]
pub async fn approve_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::approve(&state, listing_id.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to approve listing"),
    }
}

#[post("/dashboard/admin/listings/{listing_id}/reject")]
pub async fn reject_listing(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::reject(&state, listing_id.into_inner()).await {
        Ok(listing) => HttpResponse::Ok().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to reject listing"),
    }
}

#[put("/dashboard/admin/listings/{listing_id}/comped")]
pub async fn set_comped(
    req: HttpRequest,
    state: web::Data<AppState>,
    listing_id: web::Path<Uuid>,
    payload: web::Json<CompedRequest>,
) -> impl Responder {
    admin_or_return!(req);

    match moderation::set_comped(&state, listing_id.into_inner(), payload.comped).await {
        Ok(listing) => HttpResponse::Ok().json(ApiResponse::success(listing)),
        Err(err) => failure(err, "Failed to update comped flag"),
    }
}

#[cfg(test)]
mod tests {
    use crate::database::ListingStore;
    use crate::handlers::configure;
    use crate::models::{AdminListingsView, ApiResponse, Listing, ListingStatus};
    use crate::testing::{harness, listing_named};
    use actix_web::{http::StatusCode, test, web, App};
    use uuid::Uuid;

    fn admin() -> [(&'static str, String); 2] {
        [
            ("X-Actor-Id", Uuid::new_v4().to_string()),
            ("X-Actor-Role", "admin".to_string()),
        ]
    }

    #[actix_rt::test]
    async fn vendor_cannot_approve() {
        let h = harness();
        let listing = h
            .store
            .insert_listing(listing_named("Stage Ready", "Pro", ListingStatus::Pending))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/dashboard/admin/listings/{}/approve", listing.id))
            .insert_header(("X-Actor-Id", Uuid::new_v4().to_string()))
            .insert_header(("X-Actor-Role", "vendor"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let stored = h.store.get_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Pending);
    }

    #[actix_rt::test]
    async fn admin_approves_and_filters() {
        let h = harness();
        let listing = h
            .store
            .insert_listing(listing_named("Stage Ready", "Pro", ListingStatus::Pending))
            .await
            .unwrap();
        h.store
            .insert_listing(listing_named("Casting Corner", "Free", ListingStatus::Rejected))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;

        let mut req = test::TestRequest::post()
            .uri(&format!("/api/v1/dashboard/admin/listings/{}/approve", listing.id));
        for header in admin() {
            req = req.insert_header(header);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiResponse<Listing> = test::read_body_json(resp).await;
        assert_eq!(body.data.unwrap().status, ListingStatus::Live);

        let mut req = test::TestRequest::get().uri("/api/v1/dashboard/admin/listings?status=Live");
        for header in admin() {
            req = req.insert_header(header);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiResponse<AdminListingsView> = test::read_body_json(resp).await;
        let view = body.data.unwrap();
        assert_eq!(view.total, 1);
        assert_eq!(view.counts.all, 2);
        assert_eq!(view.listings[0].listing_name, "Stage Ready");
    }

    #[actix_rt::test]
    async fn delete_unknown_listing_is_not_found() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;

        let mut req = test::TestRequest::delete()
            .uri(&format!("/api/v1/dashboard/admin/listings/{}", Uuid::new_v4()));
        for header in admin() {
            req = req.insert_header(header);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
