mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    BadgeApplication, BadgeApplicationStatus, BadgeApplicationSummary, Listing, ListingStatus,
};

pub use memory::MemoryStore;
pub use postgres::Database;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("record conflicts with existing data: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistence for directory listings and their last-live snapshots.
///
/// A snapshot only exists while its listing is `Pending` after an edit of a
/// `Live` row; any write that moves the listing out of `Pending` drops it.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError>;

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError>;

    async fn get_listing_by_slug(&self, slug: &str) -> Result<Option<Listing>, StoreError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError>;

    /// Every listing, newest first.
    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError>;

    async fn list_listings_for_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError>;

    /// Overwrites the row. `live_snapshot` is stored alongside when given.
    async fn update_listing(
        &self,
        listing: &Listing,
        live_snapshot: Option<&Listing>,
    ) -> Result<Listing, StoreError>;

    /// Writes `status` and nothing else.
    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<Listing, StoreError>;

    async fn set_comped(&self, id: Uuid, comped: bool) -> Result<Listing, StoreError>;

    /// Flags every listing owned by `owner_id`; returns the number touched.
    async fn set_badge_approved_for_owner(&self, owner_id: Uuid) -> Result<u64, StoreError>;

    async fn delete_listing(&self, id: Uuid) -> Result<(), StoreError>;

    async fn live_snapshot(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError>;

    async fn list_live_snapshots(&self) -> Result<Vec<Listing>, StoreError>;
}

/// Persistence for vendor badge applications (one per vendor).
#[async_trait]
pub trait BadgeApplicationStore: Send + Sync {
    async fn get_application(&self, id: Uuid) -> Result<Option<BadgeApplication>, StoreError>;

    async fn get_application_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<BadgeApplication>, StoreError>;

    /// Insert or replace keyed on `vendor_id`.
    async fn upsert_application(
        &self,
        application: &BadgeApplication,
    ) -> Result<BadgeApplication, StoreError>;

    /// Newest first, joined with the vendor's first listing.
    async fn list_applications(
        &self,
        status: Option<BadgeApplicationStatus>,
    ) -> Result<Vec<BadgeApplicationSummary>, StoreError>;

    async fn review_application(
        &self,
        id: Uuid,
        status: BadgeApplicationStatus,
        admin_notes: Option<String>,
    ) -> Result<BadgeApplication, StoreError>;
}
