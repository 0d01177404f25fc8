use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use super::{listing_path, revalidate, Actor};
use crate::error::ServiceError;
use crate::models::{Listing, ListingFields, ListingStatus, SubmissionOutcome, SubmitListingRequest};
use crate::plan::Plan;
use crate::slug::unique_slug;
use crate::state::AppState;

/// Free listings wait for review; paid plans publish immediately.
pub fn initial_status(plan: Plan) -> ListingStatus {
    if plan.is_paid() {
        ListingStatus::Live
    } else {
        ListingStatus::Pending
    }
}

/// A Live listing goes back to review when edited.
pub fn edited_status(previous: ListingStatus) -> ListingStatus {
    match previous {
        ListingStatus::Live => ListingStatus::Pending,
        other => other,
    }
}

fn outcome_message(listing: &Listing, is_edit: bool) -> String {
    match (is_edit, listing.status) {
        (true, ListingStatus::Pending) => {
            "Your changes were saved and are awaiting review.".to_string()
        }
        (true, _) => "Your changes were saved.".to_string(),
        (false, ListingStatus::Live) => "Your listing is live in the directory.".to_string(),
        (false, _) => "Thanks! Your listing was submitted and is awaiting review.".to_string(),
    }
}

/// Vendor submit form: creates a listing or edits an existing one.
pub async fn submit_listing(
    state: &AppState,
    actor: Option<&Actor>,
    request: SubmitListingRequest,
) -> Result<SubmissionOutcome, ServiceError> {
    request.validate()?;

    let is_edit = request.is_edit;
    let listing_id = request.listing_id;
    let fields = request.into_fields().map_err(ServiceError::Validation)?;

    let listing = if is_edit {
        let id = listing_id.ok_or_else(|| {
            ServiceError::Validation("listingId: Listing ID is required when editing".into())
        })?;
        edit_listing(state, actor, id, fields).await?
    } else {
        create_listing(state, actor, fields).await?
    };

    state.notifier.listing_submitted(&listing, is_edit).await;
    let mut paths = vec!["/submit".to_string(), "/".to_string()];
    if is_edit {
        paths.push(listing_path(&listing.slug));
    }
    revalidate(state.pages.as_ref(), paths).await;

    Ok(SubmissionOutcome {
        listing_id: listing.id,
        slug: listing.slug.clone(),
        status: listing.status,
        message: outcome_message(&listing, is_edit),
    })
}

async fn create_listing(
    state: &AppState,
    actor: Option<&Actor>,
    fields: ListingFields,
) -> Result<Listing, ServiceError> {
    let slug = unique_slug(state.listings.as_ref(), &fields.listing_name).await?;
    let status = initial_status(fields.plan);
    let listing = fields.into_new_listing(slug, actor.map(|a| a.id), status);

    let listing = state.listings.insert_listing(listing).await?;
    log::info!(
        "Listing {} ({}) submitted on plan {:?} as {}",
        listing.id,
        listing.slug,
        listing.plan,
        listing.status.label()
    );
    Ok(listing)
}

async fn edit_listing(
    state: &AppState,
    actor: Option<&Actor>,
    id: Uuid,
    fields: ListingFields,
) -> Result<Listing, ServiceError> {
    let actor = actor.ok_or_else(|| {
        ServiceError::Forbidden("You must be signed in to edit a listing".into())
    })?;

    let existing = state
        .listings
        .get_listing(id)
        .await?
        .ok_or(ServiceError::NotFound("Listing"))?;

    if existing.owner_id.is_some_and(|owner| owner != actor.id) {
        return Err(ServiceError::Forbidden(
            "You do not have permission to edit this listing".into(),
        ));
    }

    let mut updated = existing.clone();
    fields.apply_to_existing(&mut updated);
    updated.status = edited_status(existing.status);

    let snapshot = (existing.status == ListingStatus::Live
        && updated.status == ListingStatus::Pending)
        .then_some(&existing);
    let listing = state.listings.update_listing(&updated, snapshot).await?;

    log::info!(
        "Listing {} edited by {}, status {} -> {}",
        listing.id,
        actor.id,
        existing.status.label(),
        listing.status.label()
    );
    Ok(listing)
}

/// Vendor takes ownership of an unclaimed listing. Status is left to
/// moderation.
pub async fn claim_listing(
    state: &AppState,
    actor: &Actor,
    id: Uuid,
) -> Result<Listing, ServiceError> {
    let existing = state
        .listings
        .get_listing(id)
        .await?
        .ok_or(ServiceError::NotFound("Listing"))?;

    if existing.owner_id == Some(actor.id) {
        return Err(ServiceError::Conflict("You already own this listing".into()));
    }
    if existing.is_claimed {
        return Err(ServiceError::Conflict(
            "This listing has already been claimed".into(),
        ));
    }

    let now = Utc::now();
    let mut claimed = existing;
    claimed.is_claimed = true;
    claimed.owner_id = Some(actor.id);
    claimed.claimed_by_email = actor.email.clone();
    claimed.date_claimed = Some(now);
    claimed.updated_at = now;

    let listing = state.listings.update_listing(&claimed, None).await?;
    log::info!("Listing {} claimed by {}", listing.id, actor.id);

    state
        .notifier
        .listing_claimed(&listing, actor.email.as_deref())
        .await;
    revalidate(
        state.pages.as_ref(),
        ["/".to_string(), "/directory".to_string(), listing_path(&listing.slug)],
    )
    .await;

    Ok(listing)
}

/// The actor's own listings, newest first.
pub async fn vendor_listings(state: &AppState, actor: &Actor) -> Result<Vec<Listing>, ServiceError> {
    Ok(state.listings.list_listings_for_owner(actor.id).await?)
}
