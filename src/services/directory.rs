use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::clients::{Category, Place, Tag};
use crate::error::ServiceError;
use crate::models::{CategoryPage, DirectoryQuery, Listing, ListingStatus, PublicListingView};
use crate::plan::{capabilities, obfuscate_email, Viewer};
use crate::state::AppState;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Publicly visible rows: Live + active, plus the last live version of
/// listings whose edits are awaiting review.
async fn visible_listings(state: &AppState) -> Result<Vec<Listing>, ServiceError> {
    let mut visible: Vec<Listing> = state
        .listings
        .list_listings()
        .await?
        .into_iter()
        .filter(Listing::is_publicly_visible)
        .collect();

    let snapshots = state.listings.list_live_snapshots().await?;
    visible.extend(snapshots.into_iter().filter(Listing::is_publicly_visible));
    Ok(visible)
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|value| value.trim().eq_ignore_ascii_case(needle))
}

pub fn matches_query(listing: &Listing, query: &DirectoryQuery) -> bool {
    if let Some(state) = non_blank(query.state.as_deref()) {
        if listing.state.as_deref() != Some(state) {
            return false;
        }
    }
    if let Some(city) = non_blank(query.city.as_deref()) {
        if listing.city.as_deref() != Some(city) {
            return false;
        }
    }
    if let Some(region) = non_blank(query.region.as_deref()) {
        if !contains_ci(&listing.region, region) {
            return false;
        }
    }
    if let Some(category) = non_blank(query.category.as_deref()) {
        if !contains_ci(&listing.categories, category) {
            return false;
        }
    }
    if let Some(q) = non_blank(query.q.as_deref()) {
        let needle = q.to_lowercase();
        let fields = [
            Some(listing.listing_name.as_str()),
            listing.what_you_offer.as_deref(),
            listing.city.as_deref(),
            listing.state.as_deref(),
        ];
        if !fields
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    true
}

/// Keeps only the highest plan among listings with the same owner and
/// name. Unclaimed listings are never collapsed.
pub fn collapse_duplicates(listings: Vec<Listing>) -> Vec<Listing> {
    let mut best: HashMap<(Uuid, String), Listing> = HashMap::new();
    let mut unclaimed = Vec::new();

    for listing in listings {
        let Some(owner) = listing.owner_id else {
            unclaimed.push(listing);
            continue;
        };
        let key = (owner, listing.listing_name.trim().to_lowercase());
        match best.get(&key) {
            Some(kept) if kept.plan_priority() >= listing.plan_priority() => {
                log::debug!(
                    "Hiding duplicate listing {} ({:?}) in favour of {}",
                    listing.id,
                    listing.plan,
                    kept.id
                );
            }
            _ => {
                best.insert(key, listing);
            }
        }
    }

    best.into_values().chain(unclaimed).collect()
}

/// Featured first, then plan priority, then name.
pub fn compare_for_directory(a: &Listing, b: &Listing) -> Ordering {
    b.featured
        .cmp(&a.featured)
        .then_with(|| b.plan_priority().cmp(&a.plan_priority()))
        .then_with(|| {
            a.listing_name
                .to_lowercase()
                .cmp(&b.listing_name.to_lowercase())
        })
}

pub fn public_view(mut listing: Listing, viewer: Viewer) -> PublicListingView {
    let tier = listing.tier();
    let capabilities = capabilities(tier, viewer);
    if !capabilities.email_clickable {
        listing.email = listing.email.as_deref().map(obfuscate_email);
    }
    if !capabilities.phone_clickable {
        listing.phone = None;
    }
    PublicListingView {
        listing,
        tier,
        capabilities,
    }
}

async fn search(
    state: &AppState,
    query: &DirectoryQuery,
) -> Result<Vec<PublicListingView>, ServiceError> {
    let matching: Vec<Listing> = visible_listings(state)
        .await?
        .into_iter()
        .filter(|listing| matches_query(listing, query))
        .collect();

    let mut listings = collapse_duplicates(matching);
    listings.sort_by(compare_for_directory);

    Ok(listings
        .into_iter()
        .map(|listing| public_view(listing, Viewer::Public))
        .collect())
}

pub async fn directory(
    state: &AppState,
    query: &DirectoryQuery,
) -> Result<Vec<PublicListingView>, ServiceError> {
    search(state, query).await
}

/// Listing page. A listing under re-review shows its last live version.
pub async fn listing_by_slug(
    state: &AppState,
    slug: &str,
    viewer: Viewer,
) -> Result<PublicListingView, ServiceError> {
    let listing = state
        .listings
        .get_listing_by_slug(slug)
        .await?
        .ok_or(ServiceError::NotFound("Listing"))?;

    if viewer == Viewer::Admin {
        return Ok(public_view(listing, viewer));
    }

    if listing.status == ListingStatus::Pending {
        if let Some(snapshot) = state.listings.live_snapshot(listing.id).await? {
            if snapshot.is_publicly_visible() {
                return Ok(public_view(snapshot, viewer));
            }
        }
    }

    if listing.is_publicly_visible() {
        Ok(public_view(listing, viewer))
    } else {
        Err(ServiceError::NotFound("Listing"))
    }
}

pub async fn category_page(state: &AppState, slug: &str) -> Result<CategoryPage, ServiceError> {
    let category = state
        .taxonomy
        .category(slug)
        .await?
        .ok_or(ServiceError::NotFound("Category"))?;

    let query = DirectoryQuery {
        category: Some(category.name.clone()),
        ..DirectoryQuery::default()
    };
    let listings = search(state, &query).await?;

    Ok(CategoryPage { category, listings })
}

pub async fn categories(state: &AppState) -> Result<Vec<Category>, ServiceError> {
    Ok(state.taxonomy.categories().await?)
}

pub async fn tags(state: &AppState) -> Result<Vec<Tag>, ServiceError> {
    Ok(state.taxonomy.tags().await?)
}

pub async fn reverse_geocode(state: &AppState, lat: f64, lon: f64) -> Result<Place, ServiceError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ServiceError::Validation(
            "lat/lon: Coordinates are out of range".into(),
        ));
    }
    Ok(state.geocoder.reverse(lat, lon).await?)
}
