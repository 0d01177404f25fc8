use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use super::{failure, require_admin, require_vendor};
use crate::models::{
    ApiResponse, BadgeDraftRequest, BadgeReviewQuery, BadgeReviewRequest, DocumentKind,
};
use crate::services::badges;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

fn parse_kind(raw: &str) -> Result<DocumentKind, HttpResponse> {
    raw.parse::<DocumentKind>()
        .map_err(|message| HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)))
}

// ============================================================================
// VENDOR WIZARD
// ============================================================================

#[get("/dashboard/vendor/badge-application")]
pub async fn get_application(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let actor = match require_vendor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match badges::get_application(&state, actor.id).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to load badge application"),
    }
}

#[put("/dashboard/vendor/badge-application/draft")]
pub async fn save_draft(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<BadgeDraftRequest>,
) -> impl Responder {
    let actor = match require_vendor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match badges::save_draft(&state, actor.id, payload.into_inner()).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to save badge application"),
    }
}

#[post("/dashboard/vendor/badge-application/submit")]
pub async fn submit_application(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: Option<web::Json<BadgeDraftRequest>>,
) -> impl Responder {
    let actor = match require_vendor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let request = payload.map(web::Json::into_inner);
    match badges::submit(&state, actor.id, request).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to submit badge application"),
    }
}

/// Raw file body. The name comes from `?filename=`, the type from `Content-Type`.
#[post("/dashboard/vendor/badge-application/documents/{kind}")]
pub async fn upload_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    kind: web::Path<String>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let actor = match require_vendor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let file_name = query.filename.as_deref().unwrap_or("document");
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");

    match badges::upload_document(
        &state,
        actor.id,
        kind,
        file_name,
        content_type,
        body.to_vec(),
    )
    .await
    {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to upload document"),
    }
}

#[delete("/dashboard/vendor/badge-application/documents/{kind}/{index}")]
pub async fn remove_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<(String, usize)>,
) -> impl Responder {
    let actor = match require_vendor(&req) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let (kind, index) = path.into_inner();
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match badges::remove_document(&state, actor.id, kind, index).await {
        Ok(view) => HttpResponse::Ok().json(ApiResponse::success(view)),
        Err(err) => failure(err, "Failed to remove document"),
    }
}

// ============================================================================
// ADMIN REVIEW
// ============================================================================

#[get("/dashboard/admin/badge-applications")]
pub async fn list_applications(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<BadgeReviewQuery>,
) -> impl Responder {
    if let Err(response) = require_admin(&req) {
        return response;
    }

    match badges::list_for_review(&state, query.status).await {
        Ok(list) => HttpResponse::Ok().json(ApiResponse::success(list)),
        Err(err) => failure(err, "Failed to list badge applications"),
    }
}

#[post("/dashboard/admin/badge-applications/{application_id}/approve")]
pub async fn approve_application(
    req: HttpRequest,
    state: web::Data<AppState>,
    application_id: web::Path<Uuid>,
    payload: Option<web::Json<BadgeReviewRequest>>,
) -> impl Responder {
    if let Err(response) = require_admin(&req) {
        return response;
    }

    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    match badges::approve(&state, application_id.into_inner(), request).await {
        Ok(application) => HttpResponse::Ok().json(ApiResponse::success(application)),
        Err(err) => failure(err, "Failed to approve badge application"),
    }
}

#[post("/dashboard/admin/badge-applications/{application_id}/reject")]
pub async fn reject_application(
    req: HttpRequest,
    state: web::Data<AppState>,
    application_id: web::Path<Uuid>,
    payload: web::Json<BadgeReviewRequest>,
) -> impl Responder {
    if let Err(response) = require_admin(&req) {
        return response;
    }

    match badges::reject(&state, application_id.into_inner(), payload.into_inner()).await {
        Ok(application) => HttpResponse::Ok().json(ApiResponse::success(application)),
        Err(err) => failure(err, "Failed to reject badge application"),
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::configure;
    use crate::models::{ApiResponse, BadgeApplicationStatus, BadgeApplicationView};
    use crate::testing::harness;
    use actix_web::{http::StatusCode, test, web, App};
    use serde_json::json;
    use uuid::Uuid;

    fn urls(prefix: &str, n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://cdn.example.com/{prefix}-{i}.pdf"))
            .collect()
    }

    #[actix_rt::test]
    async fn submit_is_gated_until_documents_are_in() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;
        let vendor = Uuid::new_v4().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/dashboard/vendor/badge-application/submit")
            .insert_header(("X-Actor-Id", vendor.clone()))
            .set_json(json!({ "testimonials": urls("t", 1) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/dashboard/vendor/badge-application/submit")
            .insert_header(("X-Actor-Id", vendor.clone()))
            .set_json(json!({
                "testimonials": urls("t", 3),
                "industry_references": urls("r", 2)
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiResponse<BadgeApplicationView> = test::read_body_json(resp).await;
        assert_eq!(
            body.data.unwrap().application.status,
            BadgeApplicationStatus::Submitted
        );
    }

    #[actix_rt::test]
    async fn upload_rejects_unknown_kind_and_stores_documents() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;
        let vendor = Uuid::new_v4().to_string();

        let req = test::TestRequest::post()
            .uri("/api/v1/dashboard/vendor/badge-application/documents/selfies?filename=me.png")
            .insert_header(("X-Actor-Id", vendor.clone()))
            .insert_header(("Content-Type", "image/png"))
            .set_payload("png-bytes")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/v1/dashboard/vendor/badge-application/documents/credentials?filename=permit.pdf")
            .insert_header(("X-Actor-Id", vendor.clone()))
            .insert_header(("Content-Type", "application/pdf"))
            .set_payload("%PDF-1.4")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ApiResponse<BadgeApplicationView> = test::read_body_json(resp).await;
        assert_eq!(body.data.unwrap().application.credentials.len(), 1);
        assert_eq!(h.storage.paths().len(), 1);
    }

    #[actix_rt::test]
    async fn wizard_refuses_non_vendor_roles() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;
        let parent = Uuid::new_v4().to_string();

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard/vendor/badge-application")
            .insert_header(("X-Actor-Id", parent.clone()))
            .insert_header(("X-Actor-Role", "parent"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::put()
            .uri("/api/v1/dashboard/vendor/badge-application/draft")
            .insert_header(("X-Actor-Id", parent.clone()))
            .insert_header(("X-Actor-Role", "parent"))
            .set_json(json!({ "testimonials": urls("t", 1) }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard/vendor/badge-application")
            .insert_header(("X-Actor-Id", parent))
            .insert_header(("X-Actor-Role", "vendor"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn review_list_is_admin_only() {
        let h = harness();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(h.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard/admin/badge-applications")
            .insert_header(("X-Actor-Id", Uuid::new_v4().to_string()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/v1/dashboard/admin/badge-applications?status=submitted")
            .insert_header(("X-Actor-Id", Uuid::new_v4().to_string()))
            .insert_header(("X-Actor-Role", "admin"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
