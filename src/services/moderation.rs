use std::cmp::Ordering;

use uuid::Uuid;
use validator::Validate;

use super::{listing_path, revalidate};
use crate::error::ServiceError;
use crate::models::{
    AdminCreateListingRequest, AdminListingsQuery, AdminListingsView, AdminUpdateListingRequest,
    DashboardOverview, Listing, ListingStatus, StatusCounts,
};
use crate::plan::ListingTier;
use crate::slug::unique_slug;
use crate::state::AppState;

// ============================================================================
// FILTER AND SORT
// ============================================================================

pub fn status_counts(listings: &[Listing]) -> StatusCounts {
    listings.iter().fold(
        StatusCounts {
            all: listings.len(),
            ..StatusCounts::default()
        },
        |mut counts, listing| {
            match listing.status {
                ListingStatus::Pending => counts.pending += 1,
                ListingStatus::Live => counts.live += 1,
                ListingStatus::Rejected => counts.rejected += 1,
            }
            counts
        },
    )
}

fn matches_status(listing: &Listing, status: Option<&str>) -> bool {
    match status.map(str::trim) {
        None | Some("") => true,
        Some(tab) if tab.eq_ignore_ascii_case("all") => true,
        Some(tab) => listing.status.label() == tab,
    }
}

fn matches_text(listing: &Listing, needle: &str) -> bool {
    let fields = [
        Some(listing.listing_name.as_str()),
        listing.email.as_deref(),
        listing.website.as_deref(),
        listing.city.as_deref(),
        listing.state.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(needle))
}

/// Higher plan first, then name (case-insensitive).
pub fn compare_for_moderation(a: &Listing, b: &Listing) -> Ordering {
    b.plan_priority()
        .cmp(&a.plan_priority())
        .then_with(|| {
            a.listing_name
                .to_lowercase()
                .cmp(&b.listing_name.to_lowercase())
        })
}

/// Status tab, then free-text search, then plan-priority order.
pub fn filter_and_sort(listings: Vec<Listing>, query: &AdminListingsQuery) -> Vec<Listing> {
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut rows: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| matches_status(listing, query.status.as_deref()))
        .filter(|listing| needle.as_deref().map_or(true, |n| matches_text(listing, n)))
        .collect();
    rows.sort_by(compare_for_moderation);
    rows
}

/// Heuristic counters for the admin dashboard. Business policy, not data.
pub fn overview(listings: &[Listing]) -> DashboardOverview {
    let high_visibility_free = listings
        .iter()
        .filter(|l| l.status == ListingStatus::Live && !l.comped)
        .filter(|l| {
            l.plan
                .as_deref()
                .map_or(true, |p| p.trim().is_empty() || p.trim().eq_ignore_ascii_case("free"))
        })
        .count();
    let monetizable_pro = listings
        .iter()
        .filter(|l| l.tier() == ListingTier::Pro)
        .count();

    DashboardOverview {
        counts: status_counts(listings),
        high_visibility_free,
        monetizable_pro,
        comped: listings.iter().filter(|l| l.comped).count(),
        claimed: listings.iter().filter(|l| l.is_claimed).count(),
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

pub async fn admin_listings(
    state: &AppState,
    query: &AdminListingsQuery,
) -> Result<AdminListingsView, ServiceError> {
    let listings = state.listings.list_listings().await?;
    let counts = status_counts(&listings);
    let rows = filter_and_sort(listings, query);

    Ok(AdminListingsView {
        total: rows.len(),
        listings: rows,
        counts,
    })
}

pub async fn dashboard_overview(state: &AppState) -> Result<DashboardOverview, ServiceError> {
    let listings = state.listings.list_listings().await?;
    Ok(overview(&listings))
}

async fn after_mutation(state: &AppState, listing: &Listing) {
    revalidate(
        state.pages.as_ref(),
        [
            "/dashboard/admin/listings".to_string(),
            "/".to_string(),
            "/directory".to_string(),
            listing_path(&listing.slug),
        ],
    )
    .await;
}

/// Publishes the listing. Only `status` is written.
pub async fn approve(state: &AppState, id: Uuid) -> Result<Listing, ServiceError> {
    let listing = state.listings.set_status(id, ListingStatus::Live).await?;
    log::info!("Listing {id} approved");

    state.notifier.listing_live(&listing).await;
    after_mutation(state, &listing).await;
    Ok(listing)
}

pub async fn reject(state: &AppState, id: Uuid) -> Result<Listing, ServiceError> {
    let listing = state.listings.set_status(id, ListingStatus::Rejected).await?;
    log::info!("Listing {id} rejected");

    after_mutation(state, &listing).await;
    Ok(listing)
}

pub async fn set_comped(state: &AppState, id: Uuid, comped: bool) -> Result<Listing, ServiceError> {
    let listing = state.listings.set_comped(id, comped).await?;
    log::info!("Listing {id} comped set to {comped}");

    after_mutation(state, &listing).await;
    Ok(listing)
}

pub async fn delete(state: &AppState, id: Uuid) -> Result<(), ServiceError> {
    let listing = state
        .listings
        .get_listing(id)
        .await?
        .ok_or(ServiceError::NotFound("Listing"))?;
    state.listings.delete_listing(id).await?;
    log::info!("Listing {id} ({}) deleted", listing.slug);

    after_mutation(state, &listing).await;
    Ok(())
}

/// Full edit of any listing, regardless of ownership.
pub async fn admin_update(
    state: &AppState,
    id: Uuid,
    request: AdminUpdateListingRequest,
) -> Result<Listing, ServiceError> {
    request.validate()?;
    request
        .validate_business_rules()
        .map_err(ServiceError::Validation)?;

    let existing = state
        .listings
        .get_listing(id)
        .await?
        .ok_or(ServiceError::NotFound("Listing"))?;

    let mut updated = existing.clone();
    request.apply_to_existing(&mut updated);
    let listing = state.listings.update_listing(&updated, None).await?;
    log::info!(
        "Listing {id} updated by admin, status {} -> {}",
        existing.status.label(),
        listing.status.label()
    );

    if existing.status != ListingStatus::Live && listing.status == ListingStatus::Live {
        state.notifier.listing_live(&listing).await;
    }
    after_mutation(state, &listing).await;
    Ok(listing)
}

/// Adds a listing on behalf of a vendor who has not signed up yet.
pub async fn admin_create(
    state: &AppState,
    request: AdminCreateListingRequest,
) -> Result<Listing, ServiceError> {
    request.validate()?;
    request
        .validate_business_rules()
        .map_err(ServiceError::Validation)?;

    let slug = unique_slug(state.listings.as_ref(), &request.listing_name).await?;
    let listing = state
        .listings
        .insert_listing(request.into_new_listing(slug))
        .await?;
    log::info!(
        "Listing {} ({}) created by admin as {}",
        listing.id,
        listing.slug,
        listing.status.label()
    );

    if listing.status == ListingStatus::Live {
        state.notifier.listing_live(&listing).await;
    }
    after_mutation(state, &listing).await;
    Ok(listing)
}
