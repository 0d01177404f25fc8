use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{
    BadgeApplication, BadgeApplicationStatus, BadgeApplicationView, BadgeDraftRequest,
    BadgeReviewList, BadgeReviewRequest, BadgeStats, DocumentKind,
};
use crate::state::AppState;

pub const MIN_TESTIMONIALS: usize = 3;
pub const MIN_REFERENCES: usize = 2;
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

// ============================================================================
// WIZARD GATING
// ============================================================================

/// Badge wizard steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BusinessInfo = 1,
    Testimonials = 2,
    References = 3,
    Credentials = 4,
    Review = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::BusinessInfo,
        WizardStep::Testimonials,
        WizardStep::References,
        WizardStep::Credentials,
        WizardStep::Review,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }
}

fn testimonial_gap(application: &BadgeApplication) -> Option<String> {
    let have = application.testimonials.len();
    (have < MIN_TESTIMONIALS).then(|| {
        format!("At least {MIN_TESTIMONIALS} testimonials are required ({have} uploaded)")
    })
}

fn reference_gap(application: &BadgeApplication) -> Option<String> {
    let have = application.industry_references.len();
    (have < MIN_REFERENCES).then(|| {
        format!("At least {MIN_REFERENCES} industry references are required ({have} uploaded)")
    })
}

/// Whether the wizard may move past `step`.
pub fn can_advance(step: WizardStep, application: &BadgeApplication) -> Result<(), String> {
    let gap = match step {
        WizardStep::Testimonials => testimonial_gap(application),
        WizardStep::References => reference_gap(application),
        _ => None,
    };
    gap.map_or(Ok(()), Err)
}

pub fn can_submit(application: &BadgeApplication) -> Result<(), String> {
    match [testimonial_gap(application), reference_gap(application)] {
        [None, None] => Ok(()),
        gaps => Err(gaps.into_iter().flatten().collect::<Vec<_>>().join("; ")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardProgress {
    pub furthest_step: u8,
    pub can_submit: bool,
    pub testimonials: usize,
    pub references: usize,
    pub credentials: usize,
    pub blocking: Vec<String>,
}

pub fn progress(application: &BadgeApplication) -> WizardProgress {
    let mut furthest = WizardStep::BusinessInfo;
    for step in WizardStep::ALL {
        furthest = step;
        if can_advance(step, application).is_err() {
            break;
        }
    }

    WizardProgress {
        furthest_step: furthest.number(),
        can_submit: can_submit(application).is_ok(),
        testimonials: application.testimonials.len(),
        references: application.industry_references.len(),
        credentials: application.credentials.len(),
        blocking: [testimonial_gap(application), reference_gap(application)]
            .into_iter()
            .flatten()
            .collect(),
    }
}

fn view(application: BadgeApplication) -> BadgeApplicationView {
    BadgeApplicationView {
        progress: progress(&application),
        application,
    }
}

// ============================================================================
// VENDOR OPERATIONS
// ============================================================================

async fn load_or_new(state: &AppState, vendor_id: Uuid) -> Result<BadgeApplication, ServiceError> {
    Ok(state
        .badges
        .get_application_for_vendor(vendor_id)
        .await?
        .unwrap_or_else(|| BadgeApplication::new_draft(vendor_id)))
}

fn ensure_editable(application: &BadgeApplication) -> Result<(), ServiceError> {
    match application.status {
        BadgeApplicationStatus::Submitted => Err(ServiceError::Conflict(
            "Application is under review and can no longer be edited".into(),
        )),
        BadgeApplicationStatus::Approved => Err(ServiceError::Conflict(
            "Application has already been approved".into(),
        )),
        _ => Ok(()),
    }
}

/// Current application, or an unsaved draft when the vendor has none.
pub async fn get_application(
    state: &AppState,
    vendor_id: Uuid,
) -> Result<BadgeApplicationView, ServiceError> {
    Ok(view(load_or_new(state, vendor_id).await?))
}

/// Saves wizard state without gating.
pub async fn save_draft(
    state: &AppState,
    vendor_id: Uuid,
    request: BadgeDraftRequest,
) -> Result<BadgeApplicationView, ServiceError> {
    let mut application = load_or_new(state, vendor_id).await?;
    ensure_editable(&application)?;

    request.apply_to_existing(&mut application);
    application.status = BadgeApplicationStatus::Draft;

    let saved = state.badges.upsert_application(&application).await?;
    Ok(view(saved))
}

/// Final wizard step. Enforces the document minimums.
pub async fn submit(
    state: &AppState,
    vendor_id: Uuid,
    request: Option<BadgeDraftRequest>,
) -> Result<BadgeApplicationView, ServiceError> {
    let mut application = load_or_new(state, vendor_id).await?;
    ensure_editable(&application)?;

    if let Some(request) = request {
        request.apply_to_existing(&mut application);
    }
    can_submit(&application).map_err(ServiceError::Validation)?;

    application.status = BadgeApplicationStatus::Submitted;
    application.admin_notes = None;
    application.updated_at = chrono::Utc::now();

    let saved = state.badges.upsert_application(&application).await?;
    log::info!("Badge application {} submitted by vendor {vendor_id}", saved.id);
    Ok(view(saved))
}

fn storage_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

/// Uploads a supporting document and appends its URL to the draft.
pub async fn upload_document(
    state: &AppState,
    vendor_id: Uuid,
    kind: DocumentKind,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<BadgeApplicationView, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::Validation("file: Uploaded file is empty".into()));
    }
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(ServiceError::Validation(
            "file: Documents must be 10 MB or smaller".into(),
        ));
    }

    let mut application = load_or_new(state, vendor_id).await?;
    ensure_editable(&application)?;

    let path = format!(
        "{vendor_id}/{}/{}-{}",
        kind.label(),
        Uuid::new_v4(),
        storage_file_name(file_name)
    );
    let url = state.storage.upload(&path, content_type, bytes).await?;

    application.documents_mut(kind).push(url);
    application.status = BadgeApplicationStatus::Draft;
    application.updated_at = chrono::Utc::now();

    let saved = state.badges.upsert_application(&application).await?;
    Ok(view(saved))
}

pub async fn remove_document(
    state: &AppState,
    vendor_id: Uuid,
    kind: DocumentKind,
    index: usize,
) -> Result<BadgeApplicationView, ServiceError> {
    let mut application = state
        .badges
        .get_application_for_vendor(vendor_id)
        .await?
        .ok_or(ServiceError::NotFound("Badge application"))?;
    ensure_editable(&application)?;

    if index >= application.documents(kind).len() {
        return Err(ServiceError::NotFound("Document"));
    }
    application.documents_mut(kind).remove(index);
    application.status = BadgeApplicationStatus::Draft;
    application.updated_at = chrono::Utc::now();

    let saved = state.badges.upsert_application(&application).await?;
    Ok(view(saved))
}

// ============================================================================
// ADMIN OPERATIONS
// ============================================================================

pub async fn list_for_review(
    state: &AppState,
    status: Option<BadgeApplicationStatus>,
) -> Result<BadgeReviewList, ServiceError> {
    let all = state.badges.list_applications(None).await?;

    let mut stats = BadgeStats {
        total: all.len(),
        ..BadgeStats::default()
    };
    for summary in &all {
        match summary.application.status {
            BadgeApplicationStatus::Draft => stats.draft += 1,
            BadgeApplicationStatus::Submitted => stats.submitted += 1,
            BadgeApplicationStatus::Approved => stats.approved += 1,
            BadgeApplicationStatus::Rejected => stats.rejected += 1,
        }
    }

    let applications = all
        .into_iter()
        .filter(|summary| status.map_or(true, |s| summary.application.status == s))
        .collect();

    Ok(BadgeReviewList {
        applications,
        stats,
    })
}

async fn decide(
    state: &AppState,
    id: Uuid,
    status: BadgeApplicationStatus,
    admin_notes: Option<String>,
) -> Result<BadgeApplication, ServiceError> {
    let application = state
        .badges
        .get_application(id)
        .await?
        .ok_or(ServiceError::NotFound("Badge application"))?;

    if application.status != BadgeApplicationStatus::Submitted {
        return Err(ServiceError::Conflict(format!(
            "Only submitted applications can be reviewed (current status: {})",
            application.status.label()
        )));
    }

    let reviewed = state
        .badges
        .review_application(id, status, admin_notes)
        .await?;
    log::info!("Badge application {id} {}", reviewed.status.label());
    Ok(reviewed)
}

async fn notify_vendor(state: &AppState, application: &BadgeApplication) {
    let listings = match state
        .listings
        .list_listings_for_owner(application.vendor_id)
        .await
    {
        Ok(listings) => listings,
        Err(err) => {
            log::warn!(
                "Failed to look up listings for vendor {}: {err}",
                application.vendor_id
            );
            return;
        }
    };

    match listings.iter().find_map(|l| l.email.as_deref()) {
        Some(email) => state.notifier.badge_decision(application, email).await,
        None => log::warn!(
            "No contact email for vendor {}, skipping badge decision email",
            application.vendor_id
        ),
    }
}

/// Approves the application and flags the vendor's listings.
pub async fn approve(
    state: &AppState,
    id: Uuid,
    request: BadgeReviewRequest,
) -> Result<BadgeApplication, ServiceError> {
    let notes = crate::models::non_empty(request.admin_notes);
    let application = decide(state, id, BadgeApplicationStatus::Approved, notes).await?;

    match state
        .listings
        .set_badge_approved_for_owner(application.vendor_id)
        .await
    {
        Ok(count) => log::info!(
            "Badge approved on {count} listing(s) for vendor {}",
            application.vendor_id
        ),
        Err(err) => log::warn!(
            "Failed to flag listings for vendor {}: {err}",
            application.vendor_id
        ),
    }

    notify_vendor(state, &application).await;
    Ok(application)
}

/// Rejects the application; notes are mandatory.
pub async fn reject(
    state: &AppState,
    id: Uuid,
    request: BadgeReviewRequest,
) -> Result<BadgeApplication, ServiceError> {
    let notes = crate::models::non_empty(request.admin_notes).ok_or_else(|| {
        ServiceError::Validation("admin_notes: Notes are required when rejecting".into())
    })?;
    let application = decide(state, id, BadgeApplicationStatus::Rejected, Some(notes)).await?;

    notify_vendor(state, &application).await;
    Ok(application)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ListingStore;
    use crate::models::{BusinessInfo, ListingStatus};
    use crate::testing::{harness, listing_named};

    fn urls(prefix: &str, n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("https://cdn.example.com/{prefix}-{i}.pdf"))
            .collect()
    }

    fn application(testimonials: usize, references: usize) -> BadgeApplication {
        let mut app = BadgeApplication::new_draft(Uuid::new_v4());
        app.testimonials = urls("t", testimonials);
        app.industry_references = urls("r", references);
        app
    }

    #[test]
    fn gating_requires_three_testimonials_and_two_references() {
        assert!(can_advance(WizardStep::BusinessInfo, &application(0, 0)).is_ok());
        assert!(can_advance(WizardStep::Testimonials, &application(2, 0)).is_err());
        assert!(can_advance(WizardStep::Testimonials, &application(3, 0)).is_ok());
        assert!(can_advance(WizardStep::References, &application(3, 1)).is_err());
        assert!(can_advance(WizardStep::Credentials, &application(0, 0)).is_ok());

        assert!(can_submit(&application(2, 2)).is_err());
        assert!(can_submit(&application(3, 1)).is_err());
        assert!(can_submit(&application(3, 2)).is_ok());
    }

    #[test]
    fn progress_reports_furthest_step() {
        assert_eq!(progress(&application(0, 0)).furthest_step, 2);
        assert_eq!(progress(&application(3, 0)).furthest_step, 3);

        let ready = progress(&application(4, 2));
        assert_eq!(ready.furthest_step, 5);
        assert!(ready.can_submit);
        assert!(ready.blocking.is_empty());

        let blocked = progress(&application(1, 1));
        assert_eq!(blocked.blocking.len(), 2);
    }

    #[actix_rt::test]
    async fn draft_then_submit_with_gating() {
        let h = harness();
        let vendor = Uuid::new_v4();

        let fresh = get_application(&h.state, vendor).await.unwrap();
        assert_eq!(fresh.application.status, BadgeApplicationStatus::Draft);

        let draft = save_draft(
            &h.state,
            vendor,
            BadgeDraftRequest {
                business_info: Some(BusinessInfo {
                    name: "Jane Doe Photography".into(),
                    ..BusinessInfo::default()
                }),
                testimonials: Some(urls("t", 2)),
                ..BadgeDraftRequest::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(draft.progress.testimonials, 2);

        let err = submit(&h.state, vendor, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let submitted = submit(
            &h.state,
            vendor,
            Some(BadgeDraftRequest {
                testimonials: Some(urls("t", 3)),
                references: Some(urls("r", 2)),
                ..BadgeDraftRequest::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(submitted.application.status, BadgeApplicationStatus::Submitted);
        assert_eq!(
            submitted.application.business_info.as_ref().map(|b| b.name.as_str()),
            Some("Jane Doe Photography")
        );

        let err = save_draft(&h.state, vendor, BadgeDraftRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn upload_and_remove_documents() {
        let h = harness();
        let vendor = Uuid::new_v4();

        let view = upload_document(
            &h.state,
            vendor,
            DocumentKind::Testimonials,
            "Letter from Casting.pdf",
            "application/pdf",
            b"%PDF-1.4".to_vec(),
        )
        .await
        .unwrap();
        assert_eq!(view.application.testimonials.len(), 1);
        let stored = &h.storage.paths()[0];
        assert!(stored.starts_with(&format!("{vendor}/testimonials/")));
        assert!(stored.ends_with("Letter_from_Casting.pdf"));

        let err = upload_document(
            &h.state,
            vendor,
            DocumentKind::Credentials,
            "empty.pdf",
            "application/pdf",
            Vec::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let view = remove_document(&h.state, vendor, DocumentKind::Testimonials, 0)
            .await
            .unwrap();
        assert!(view.application.testimonials.is_empty());
        assert!(matches!(
            remove_document(&h.state, vendor, DocumentKind::Testimonials, 0).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    async fn submitted_application(h: &crate::testing::TestHarness, vendor: Uuid) -> Uuid {
        submit(
            &h.state,
            vendor,
            Some(BadgeDraftRequest {
                testimonials: Some(urls("t", 3)),
                references: Some(urls("r", 2)),
                ..BadgeDraftRequest::default()
            }),
        )
        .await
        .unwrap()
        .application
        .id
    }

    #[actix_rt::test]
    async fn approval_flags_vendor_listings() {
        let h = harness();
        let vendor = Uuid::new_v4();
        let mut listing = listing_named("Jane Doe Photography", "Pro", ListingStatus::Live);
        listing.owner_id = Some(vendor);
        listing.email = Some("jane@example.com".into());
        let listing = h.store.insert_listing(listing).await.unwrap();

        let id = submitted_application(&h, vendor).await;
        let approved = approve(&h.state, id, BadgeReviewRequest::default())
            .await
            .unwrap();
        assert_eq!(approved.status, BadgeApplicationStatus::Approved);

        let flagged = h.store.get_listing(listing.id).await.unwrap().unwrap();
        assert!(flagged.badge_approved);
        assert_eq!(
            h.mailer.subjects(),
            vec!["Your 101 Badge application was approved".to_string()]
        );

        let err = approve(&h.state, id, BadgeReviewRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let review = list_for_review(&h.state, Some(BadgeApplicationStatus::Approved))
            .await
            .unwrap();
        assert_eq!(review.stats.approved, 1);
        assert_eq!(
            review.applications[0].listing_name.as_deref(),
            Some("Jane Doe Photography")
        );
    }

    #[actix_rt::test]
    async fn rejection_needs_notes_and_allows_rework() {
        let h = harness();
        let vendor = Uuid::new_v4();
        let id = submitted_application(&h, vendor).await;

        let err = reject(
            &h.state,
            id,
            BadgeReviewRequest {
                admin_notes: Some("   ".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let rejected = reject(
            &h.state,
            id,
            BadgeReviewRequest {
                admin_notes: Some("Please add a casting director reference".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(rejected.status, BadgeApplicationStatus::Rejected);

        let reworked = save_draft(&h.state, vendor, BadgeDraftRequest::default())
            .await
            .unwrap();
        assert_eq!(reworked.application.status, BadgeApplicationStatus::Draft);
    }
}
