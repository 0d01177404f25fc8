use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{BadgeApplicationStore, ListingStore, StoreError};
use crate::models::{
    BadgeApplication, BadgeApplicationStatus, BadgeApplicationSummary, Listing, ListingStatus,
};

#[derive(Default)]
struct MemoryState {
    listings: HashMap<Uuid, Listing>,
    snapshots: HashMap<Uuid, Listing>,
    applications: HashMap<Uuid, BadgeApplication>,
}

/// Process-local store used when no database is configured and in tests.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store mutex poisoned".into()))
    }
}

fn newest_first(mut listings: Vec<Listing>) -> Vec<Listing> {
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    listings
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let mut state = self.lock()?;
        if state.listings.contains_key(&listing.id) {
            return Err(StoreError::Conflict(format!("listing {} exists", listing.id)));
        }
        if state.listings.values().any(|l| l.slug == listing.slug) {
            return Err(StoreError::Conflict(format!("slug {} is taken", listing.slug)));
        }
        state.listings.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        Ok(self.lock()?.listings.get(&id).cloned())
    }

    async fn get_listing_by_slug(&self, slug: &str) -> Result<Option<Listing>, StoreError> {
        Ok(self
            .lock()?
            .listings
            .values()
            .find(|listing| listing.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.listings.values().any(|l| l.slug == slug))
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let state = self.lock()?;
        Ok(newest_first(state.listings.values().cloned().collect()))
    }

    async fn list_listings_for_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let state = self.lock()?;
        Ok(newest_first(
            state
                .listings
                .values()
                .filter(|l| l.owner_id == Some(owner_id))
                .cloned()
                .collect(),
        ))
    }

    async fn update_listing(
        &self,
        listing: &Listing,
        live_snapshot: Option<&Listing>,
    ) -> Result<Listing, StoreError> {
        let mut state = self.lock()?;
        let Some(existing) = state.listings.get_mut(&listing.id) else {
            return Err(StoreError::NotFound);
        };
        let created_at = existing.created_at;
        *existing = listing.clone();
        existing.created_at = created_at;
        let record = existing.clone();

        if let Some(snapshot) = live_snapshot {
            state.snapshots.insert(record.id, snapshot.clone());
        }
        if record.status != ListingStatus::Pending {
            state.snapshots.remove(&record.id);
        }
        Ok(record)
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<Listing, StoreError> {
        let mut state = self.lock()?;
        let record = {
            let listing = state.listings.get_mut(&id).ok_or(StoreError::NotFound)?;
            listing.status = status;
            listing.clone()
        };
        if status != ListingStatus::Pending {
            state.snapshots.remove(&id);
        }
        Ok(record)
    }

    async fn set_comped(&self, id: Uuid, comped: bool) -> Result<Listing, StoreError> {
        let mut state = self.lock()?;
        let listing = state.listings.get_mut(&id).ok_or(StoreError::NotFound)?;
        listing.comped = comped;
        Ok(listing.clone())
    }

    async fn set_badge_approved_for_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.lock()?;
        let mut touched = 0;
        for listing in state
            .listings
            .values_mut()
            .filter(|l| l.owner_id == Some(owner_id))
        {
            listing.badge_approved = true;
            listing.updated_at = Utc::now();
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.snapshots.remove(&id);
        state
            .listings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn live_snapshot(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError> {
        Ok(self.lock()?.snapshots.get(&listing_id).cloned())
    }

    async fn list_live_snapshots(&self) -> Result<Vec<Listing>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .snapshots
            .iter()
            .filter(|(id, _)| {
                state
                    .listings
                    .get(*id)
                    .is_some_and(|l| l.status == ListingStatus::Pending)
            })
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }
}

#[async_trait]
impl BadgeApplicationStore for MemoryStore {
    async fn get_application(&self, id: Uuid) -> Result<Option<BadgeApplication>, StoreError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    async fn get_application_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<BadgeApplication>, StoreError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .find(|a| a.vendor_id == vendor_id)
            .cloned())
    }

    async fn upsert_application(
        &self,
        application: &BadgeApplication,
    ) -> Result<BadgeApplication, StoreError> {
        let mut state = self.lock()?;
        let existing = state
            .applications
            .values()
            .find(|a| a.vendor_id == application.vendor_id)
            .map(|a| (a.id, a.created_at));

        let mut record = application.clone();
        if let Some((id, created_at)) = existing {
            record.id = id;
            record.created_at = created_at;
        }
        state.applications.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_applications(
        &self,
        status: Option<BadgeApplicationStatus>,
    ) -> Result<Vec<BadgeApplicationSummary>, StoreError> {
        let state = self.lock()?;
        let mut summaries: Vec<BadgeApplicationSummary> = state
            .applications
            .values()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .map(|application| {
                let listing = state
                    .listings
                    .values()
                    .filter(|l| l.owner_id == Some(application.vendor_id))
                    .min_by_key(|l| l.created_at);
                BadgeApplicationSummary {
                    application: application.clone(),
                    listing_name: listing.map(|l| l.listing_name.clone()),
                    categories: listing.map(|l| l.categories.clone()),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(summaries)
    }

    async fn review_application(
        &self,
        id: Uuid,
        status: BadgeApplicationStatus,
        admin_notes: Option<String>,
    ) -> Result<BadgeApplication, StoreError> {
        let mut state = self.lock()?;
        let application = state.applications.get_mut(&id).ok_or(StoreError::NotFound)?;
        application.status = status;
        application.admin_notes = admin_notes;
        application.updated_at = Utc::now();
        Ok(application.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::listing_named;

    #[actix_rt::test]
    async fn snapshot_survives_only_while_pending() {
        let store = MemoryStore::new();
        let live = store
            .insert_listing(listing_named("Studio West", "Pro", ListingStatus::Live))
            .await
            .unwrap();

        let mut edited = live.clone();
        edited.listing_name = "Studio West LA".into();
        edited.status = ListingStatus::Pending;
        store.update_listing(&edited, Some(&live)).await.unwrap();

        assert_eq!(store.list_live_snapshots().await.unwrap(), vec![live.clone()]);

        store.set_status(live.id, ListingStatus::Live).await.unwrap();
        assert!(store.live_snapshot(live.id).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn duplicate_slug_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .insert_listing(listing_named("Acme", "Free", ListingStatus::Pending))
            .await
            .unwrap();
        let err = store
            .insert_listing(listing_named("Acme", "Free", ListingStatus::Pending))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn upsert_keeps_one_application_per_vendor() {
        let store = MemoryStore::new();
        let vendor = Uuid::new_v4();
        let first = store
            .upsert_application(&BadgeApplication::new_draft(vendor))
            .await
            .unwrap();

        let mut second = BadgeApplication::new_draft(vendor);
        second.testimonials = vec!["https://cdn.example.com/t1.pdf".into()];
        let saved = store.upsert_application(&second).await.unwrap();

        assert_eq!(saved.id, first.id);
        assert_eq!(store.list_applications(None).await.unwrap().len(), 1);
    }
}
