//! Fakes and fixtures shared by the unit and HTTP tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::clients::{
    Category, ClientError, Email, Mailer, ObjectStorage, PageCache, Place, ReverseGeocoder,
    StaticTaxonomy, Tag,
};
use crate::database::MemoryStore;
use crate::models::{Listing, ListingStatus, ServiceFormat, SocialLinks};
use crate::notifications::Notifier;
use crate::slug::generate_slug;
use crate::state::AppState;

pub const SITE_URL: &str = "https://directory.test";
pub const ADMIN_EMAIL: &str = "admin@directory.test";

pub fn listing_named(name: &str, plan: &str, status: ListingStatus) -> Listing {
    let now = Utc::now();
    Listing {
        id: Uuid::new_v4(),
        slug: generate_slug(name),
        listing_name: name.to_string(),
        website: Some("https://example.com".into()),
        email: None,
        phone: None,
        city: Some("Los Angeles".into()),
        state: Some("CA".into()),
        zip: None,
        region: vec!["Los Angeles".into()],
        categories: vec!["Headshot Photographers".into()],
        age_range: Vec::new(),
        what_you_offer: None,
        who_is_it_for: None,
        why_is_it_unique: None,
        format: vec![ServiceFormat::InPerson],
        extras_notes: None,
        profile_image: None,
        gallery: Vec::new(),
        social_links: SocialLinks::default(),
        ca_permit_required: false,
        is_bonded: false,
        bond_number: None,
        plan: Some(plan.to_string()),
        status,
        is_active: true,
        is_claimed: false,
        comped: false,
        is_approved_101: false,
        badge_approved: false,
        featured: false,
        owner_id: None,
        claimed_by_email: None,
        date_claimed: None,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<Email>>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .iter()
            .map(|email| email.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), ClientError> {
        if self.fail {
            return Err(ClientError::NotConfigured("mail"));
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingPageCache {
    paths: Arc<Mutex<Vec<String>>>,
}

impl RecordingPageCache {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("cache mutex poisoned").clone()
    }
}

#[async_trait]
impl PageCache for RecordingPageCache {
    async fn revalidate(&self, paths: &[String]) -> Result<(), ClientError> {
        self.paths
            .lock()
            .expect("cache mutex poisoned")
            .extend(paths.iter().cloned());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryObjectStorage {
    objects: Arc<Mutex<Vec<(String, String, usize)>>>,
}

impl MemoryObjectStorage {
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .iter()
            .map(|(path, _, _)| path.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ClientError> {
        self.objects.lock().expect("storage mutex poisoned").push((
            path.to_string(),
            content_type.to_string(),
            bytes.len(),
        ));
        Ok(format!("https://cdn.directory.test/{path}"))
    }
}

pub struct FixedGeocoder(pub Place);

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Place, ClientError> {
        Ok(self.0.clone())
    }
}

/// Handles to the fakes wired into a test `AppState`.
pub struct TestHarness {
    pub state: AppState,
    pub store: MemoryStore,
    pub mailer: RecordingMailer,
    pub pages: RecordingPageCache,
    pub storage: MemoryObjectStorage,
}

pub fn harness() -> TestHarness {
    harness_with_mailer(RecordingMailer::default())
}

pub fn harness_with_mailer(mailer: RecordingMailer) -> TestHarness {
    let store = MemoryStore::new();
    let pages = RecordingPageCache::default();
    let storage = MemoryObjectStorage::default();
    let taxonomy = StaticTaxonomy::new(
        vec![
            Category {
                name: "Headshot Photographers".into(),
                slug: "headshot-photographers".into(),
                description: None,
            },
            Category {
                name: "Acting Coaches".into(),
                slug: "acting-coaches".into(),
                description: None,
            },
        ],
        vec![Tag {
            name: "5-8".into(),
            slug: "5-8".into(),
        }],
    );

    let state = AppState {
        listings: Arc::new(store.clone()),
        badges: Arc::new(store.clone()),
        notifier: Notifier::new(
            Arc::new(mailer.clone()),
            SITE_URL.to_string(),
            ADMIN_EMAIL.to_string(),
        ),
        pages: Arc::new(pages.clone()),
        storage: Arc::new(storage.clone()),
        taxonomy: Arc::new(taxonomy),
        geocoder: Arc::new(FixedGeocoder(Place {
            city: Some("Burbank".into()),
            state: Some("CA".into()),
        })),
    };

    TestHarness {
        state,
        store,
        mailer,
        pages,
        storage,
    }
}
