use std::sync::Arc;

use crate::clients::{ObjectStorage, PageCache, ReverseGeocoder, Taxonomy};
use crate::database::{BadgeApplicationStore, ListingStore};
use crate::notifications::Notifier;

/// Dependencies shared by every request, built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingStore>,
    pub badges: Arc<dyn BadgeApplicationStore>,
    pub notifier: Notifier,
    pub pages: Arc<dyn PageCache>,
    pub storage: Arc<dyn ObjectStorage>,
    pub taxonomy: Arc<dyn Taxonomy>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
}
