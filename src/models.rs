use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidateUrl};

use crate::plan::{self, ListingTier, Plan};

// ============================================================================
// ENUMS
// ============================================================================

/// Listing moderation status (this is also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "listing_status")]
pub enum ListingStatus {
    Pending,
    Live,
    Rejected,
}

impl ListingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "Pending",
            ListingStatus::Live => "Live",
            ListingStatus::Rejected => "Rejected",
        }
    }
}

/// Badge application lifecycle (also a Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "badge_application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BadgeApplicationStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl BadgeApplicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BadgeApplicationStatus::Draft => "draft",
            BadgeApplicationStatus::Submitted => "submitted",
            BadgeApplicationStatus::Approved => "approved",
            BadgeApplicationStatus::Rejected => "rejected",
        }
    }
}

/// How a vendor delivers their service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceFormat {
    #[serde(rename = "in-person", alias = "In-person", alias = "in_person")]
    InPerson,
    #[serde(rename = "online", alias = "Online")]
    Online,
    #[serde(rename = "hybrid", alias = "Hybrid")]
    Hybrid,
}

/// Kind of supporting document attached to a badge application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Testimonials,
    References,
    Credentials,
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "testimonials" | "testimonial" => Ok(DocumentKind::Testimonials),
            "references" | "reference" | "industry_references" => Ok(DocumentKind::References),
            "credentials" | "credential" => Ok(DocumentKind::Credentials),
            other => Err(format!("Unknown document kind '{other}'")),
        }
    }
}

impl DocumentKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Testimonials => "testimonials",
            DocumentKind::References => "references",
            DocumentKind::Credentials => "credentials",
        }
    }
}

// ============================================================================
// LISTINGS
// ============================================================================

/// Gallery image with an optional caption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Social profiles shown on Standard and Pro listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub tiktok_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub blog_url: Option<String>,
    #[serde(default)]
    pub custom_link_url: Option<String>,
    #[serde(default)]
    pub custom_link_name: Option<String>,
}

impl SocialLinks {
    /// Drops blanks and prefixes bare hosts with `https://`.
    pub fn normalized(self) -> Self {
        Self {
            facebook_url: normalize_url(self.facebook_url),
            instagram_url: normalize_url(self.instagram_url),
            tiktok_url: normalize_url(self.tiktok_url),
            youtube_url: normalize_url(self.youtube_url),
            linkedin_url: normalize_url(self.linkedin_url),
            blog_url: normalize_url(self.blog_url),
            custom_link_url: normalize_url(self.custom_link_url),
            custom_link_name: non_empty(self.custom_link_name),
        }
    }

    fn urls(&self) -> [(&'static str, &Option<String>); 7] {
        [
            ("facebook_url", &self.facebook_url),
            ("instagram_url", &self.instagram_url),
            ("tiktok_url", &self.tiktok_url),
            ("youtube_url", &self.youtube_url),
            ("linkedin_url", &self.linkedin_url),
            ("blog_url", &self.blog_url),
            ("custom_link_url", &self.custom_link_url),
        ]
    }

    pub fn check_urls(&self) -> Result<(), String> {
        for (field, value) in self.urls() {
            if let Some(url) = value {
                if !url.validate_url() {
                    return Err(format!("{field}: Invalid URL format."));
                }
            }
        }
        Ok(())
    }
}

/// Directory listing persisted in database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: Uuid,
    pub slug: String,
    pub listing_name: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub region: Vec<String>,
    pub categories: Vec<String>,
    pub age_range: Vec<String>,
    pub what_you_offer: Option<String>,
    pub who_is_it_for: Option<String>,
    pub why_is_it_unique: Option<String>,
    #[sqlx(json)]
    pub format: Vec<ServiceFormat>,
    pub extras_notes: Option<String>,
    pub profile_image: Option<String>,
    #[sqlx(json)]
    pub gallery: Vec<GalleryImage>,
    #[sqlx(json)]
    pub social_links: SocialLinks,
    pub ca_permit_required: bool,
    pub is_bonded: bool,
    pub bond_number: Option<String>,
    pub plan: Option<String>,
    pub status: ListingStatus,
    pub is_active: bool,
    pub is_claimed: bool,
    pub comped: bool,
    pub is_approved_101: bool,
    pub badge_approved: bool,
    pub featured: bool,
    pub owner_id: Option<Uuid>,
    pub claimed_by_email: Option<String>,
    pub date_claimed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn tier(&self) -> ListingTier {
        plan::tier_of(self.plan.as_deref(), self.comped)
    }

    pub fn plan_priority(&self) -> u8 {
        plan::plan_priority(self.plan.as_deref(), self.comped)
    }

    pub fn is_publicly_visible(&self) -> bool {
        self.status == ListingStatus::Live && self.is_active
    }
}

/// Descriptive fields shared by the submission and edit paths
#[derive(Debug, Clone)]
pub struct ListingFields {
    pub listing_name: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub region: Vec<String>,
    pub categories: Vec<String>,
    pub age_range: Vec<String>,
    pub what_you_offer: Option<String>,
    pub who_is_it_for: Option<String>,
    pub why_is_it_unique: Option<String>,
    pub format: Vec<ServiceFormat>,
    pub extras_notes: Option<String>,
    pub profile_image: Option<String>,
    pub gallery: Vec<GalleryImage>,
    pub social_links: SocialLinks,
    pub ca_permit_required: bool,
    pub is_bonded: bool,
    pub bond_number: Option<String>,
    pub plan: Plan,
    pub is_active: bool,
}

impl ListingFields {
    pub fn into_new_listing(
        self,
        slug: String,
        owner_id: Option<Uuid>,
        status: ListingStatus,
    ) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            slug,
            listing_name: self.listing_name,
            website: self.website,
            email: self.email,
            phone: self.phone,
            city: self.city,
            state: self.state,
            zip: self.zip,
            region: self.region,
            categories: self.categories,
            age_range: self.age_range,
            what_you_offer: self.what_you_offer,
            who_is_it_for: self.who_is_it_for,
            why_is_it_unique: self.why_is_it_unique,
            format: self.format,
            extras_notes: self.extras_notes,
            profile_image: self.profile_image,
            gallery: self.gallery,
            social_links: self.social_links,
            ca_permit_required: self.ca_permit_required,
            is_bonded: self.is_bonded,
            bond_number: self.bond_number,
            plan: Some(self.plan.label().to_string()),
            status,
            is_active: self.is_active,
            is_claimed: false,
            comped: false,
            is_approved_101: false,
            badge_approved: false,
            featured: false,
            owner_id,
            claimed_by_email: None,
            date_claimed: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites descriptive fields and plan. Slug, ownership, badges and
    /// status are left to the caller.
    pub fn apply_to_existing(self, existing: &mut Listing) {
        existing.listing_name = self.listing_name;
        existing.website = self.website;
        existing.email = self.email;
        existing.phone = self.phone;
        existing.city = self.city;
        existing.state = self.state;
        existing.zip = self.zip;
        existing.region = self.region;
        existing.categories = self.categories;
        existing.age_range = self.age_range;
        existing.what_you_offer = self.what_you_offer;
        existing.who_is_it_for = self.who_is_it_for;
        existing.why_is_it_unique = self.why_is_it_unique;
        existing.format = self.format;
        existing.extras_notes = self.extras_notes;
        existing.profile_image = self.profile_image;
        existing.gallery = self.gallery;
        existing.social_links = self.social_links;
        existing.ca_permit_required = self.ca_permit_required;
        existing.is_bonded = self.is_bonded;
        existing.bond_number = self.bond_number;
        existing.plan = Some(self.plan.label().to_string());
        existing.is_active = self.is_active;
        existing.updated_at = Utc::now();
    }
}

// ============================================================================
// BADGE APPLICATIONS
// ============================================================================

/// Business details captured on the first wizard step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub location: String,
}

/// Vendor application for the 101 trust badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BadgeApplication {
    pub id: Uuid,
    pub vendor_id: Uuid,
    #[sqlx(json)]
    pub business_info: Option<BusinessInfo>,
    pub testimonials: Vec<String>,
    pub industry_references: Vec<String>,
    pub credentials: Vec<String>,
    pub status: BadgeApplicationStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BadgeApplication {
    pub fn new_draft(vendor_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            business_info: None,
            testimonials: Vec::new(),
            industry_references: Vec::new(),
            credentials: Vec::new(),
            status: BadgeApplicationStatus::Draft,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn documents(&self, kind: DocumentKind) -> &Vec<String> {
        match kind {
            DocumentKind::Testimonials => &self.testimonials,
            DocumentKind::References => &self.industry_references,
            DocumentKind::Credentials => &self.credentials,
        }
    }

    pub fn documents_mut(&mut self, kind: DocumentKind) -> &mut Vec<String> {
        match kind {
            DocumentKind::Testimonials => &mut self.testimonials,
            DocumentKind::References => &mut self.industry_references,
            DocumentKind::Credentials => &mut self.credentials,
        }
    }
}

/// Badge application row joined with the vendor's listing for review tables
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BadgeApplicationSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: BadgeApplication,
    pub listing_name: Option<String>,
    pub categories: Option<Vec<String>>,
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// A single value or a list; forms send both shapes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl OneOrMany<String> {
    /// Flattens comma separated entries and drops blanks.
    pub fn into_list(self) -> Vec<String> {
        self.into_vec()
            .iter()
            .flat_map(|value| split_list(value))
            .collect()
    }
}

/// Gallery entries arrive as bare URLs (legacy) or `{url, caption}` objects
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GalleryEntry {
    Url(String),
    Image(GalleryImage),
}

impl GalleryEntry {
    fn into_image(self) -> Option<GalleryImage> {
        let image = match self {
            GalleryEntry::Url(url) => GalleryImage { url, caption: None },
            GalleryEntry::Image(image) => image,
        };
        let url = image.url.trim().to_string();
        if url.is_empty() {
            return None;
        }
        Some(GalleryImage {
            url,
            caption: non_empty(image.caption),
        })
    }
}

pub fn gallery_from_entries(entries: Vec<GalleryEntry>) -> Vec<GalleryImage> {
    entries
        .into_iter()
        .filter_map(GalleryEntry::into_image)
        .collect()
}

/// Payload sent by vendors from the public submit form (new or edit)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitListingRequest {
    #[validate(length(min = 1, max = 100, message = "Business name is required (100 characters max)"))]
    pub name: String,
    pub link: String,
    #[validate(length(max = 256, message = "Description must be 256 or fewer characters long"))]
    pub description: Option<String>,
    #[validate(length(max = 4096, message = "Introduction must be 4096 or fewer characters long"))]
    pub introduction: Option<String>,
    pub unique: Option<String>,
    pub format: OneOrMany<ServiceFormat>,
    pub notes: Option<String>,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    pub zip: Option<String>,
    #[serde(default)]
    pub region: OneOrMany<String>,
    pub bond_number: Option<String>,
    pub plan: String,
    #[serde(default)]
    pub performer_permit: bool,
    #[serde(default)]
    pub bonded: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(min = 1, message = "Please select at least one category"))]
    pub categories: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<GalleryEntry>,
    pub image_id: Option<String>,
    pub active: Option<bool>,
    #[serde(flatten)]
    pub social_links: SocialLinks,
    pub listing_id: Option<Uuid>,
    #[serde(default)]
    pub is_edit: bool,
}

impl SubmitListingRequest {
    /// Applies the checks the derive cannot express and normalises the form
    /// into listing fields.
    pub fn into_fields(self) -> Result<ListingFields, String> {
        let listing_name = non_empty(Some(self.name))
            .ok_or_else(|| "name: Business name is required (100 characters max)".to_string())?;
        let city = non_empty(Some(self.city)).ok_or_else(|| "city: City is required".to_string())?;
        let state =
            non_empty(Some(self.state)).ok_or_else(|| "state: State is required".to_string())?;

        let plan: Plan = self.plan.parse()?;

        let website = normalize_url(Some(self.link))
            .ok_or_else(|| "link: Please enter a valid website URL".to_string())?;
        if !website.validate_url() {
            return Err("link: Please enter a valid website URL".into());
        }

        let format = self.format.into_vec();
        if format.is_empty() {
            return Err("format: Please select at least one service format".into());
        }

        let region = self.region.into_list();
        if region.is_empty() {
            return Err("region: Please select at least one region".into());
        }

        let zip = non_empty(self.zip);
        if let Some(zip) = &zip {
            if !is_valid_zip(zip) {
                return Err("zip: ZIP code must be 5 digits".into());
            }
        }

        let bond_number = non_empty(self.bond_number);
        if self.bonded && bond_number.is_none() {
            return Err(
                "bondNumber: Bond number is required when 'Bonded for Advanced Fees' is enabled"
                    .into(),
            );
        }

        let categories: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if categories.is_empty() {
            return Err("categories: Please select at least one category".into());
        }
        if let Some(max) = plan.max_categories() {
            if categories.len() > max {
                return Err(format!(
                    "categories: The {} plan allows {max} category",
                    plan.label()
                ));
            }
        }

        let gallery = gallery_from_entries(self.gallery);
        if gallery.len() > plan.max_gallery_images() {
            return Err(format!(
                "gallery: The {} plan includes up to {} gallery images",
                plan.label(),
                plan.max_gallery_images()
            ));
        }

        let social_links = self.social_links.normalized();
        social_links.check_urls()?;

        Ok(ListingFields {
            listing_name,
            website: Some(website),
            email: Some(self.email.trim().to_string()),
            phone: non_empty(self.phone),
            city: Some(city),
            state: Some(state),
            zip,
            region,
            categories,
            age_range: self.tags,
            what_you_offer: non_empty(self.description),
            who_is_it_for: non_empty(self.introduction),
            why_is_it_unique: non_empty(self.unique),
            format,
            extras_notes: non_empty(self.notes),
            profile_image: non_empty(self.image_id),
            gallery,
            social_links,
            ca_permit_required: self.performer_permit,
            is_bonded: self.bonded,
            bond_number,
            plan,
            is_active: self.active.unwrap_or(true),
        })
    }
}

/// Result of the submit/edit action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub listing_id: Uuid,
    pub slug: String,
    pub status: ListingStatus,
    pub message: String,
}

/// Admin-side listing creation (free listings added on behalf of vendors)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminCreateListingRequest {
    #[validate(length(min = 1, message = "Listing name is required."))]
    pub listing_name: String,
    pub status: ListingStatus,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub what_you_offer: Option<String>,
    pub plan: Option<String>,
    pub category: Option<String>,
    pub format: Option<ServiceFormat>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub age_tags: Option<String>,
    #[serde(flatten)]
    pub social_links: SocialLinks,
}

impl AdminCreateListingRequest {
    pub fn validate_business_rules(&self) -> Result<(), String> {
        check_optional_url("website", &self.website)?;
        check_optional_email(&self.email)?;
        self.social_links.clone().normalized().check_urls()?;
        if let Some(plan) = non_empty(self.plan.clone()) {
            plan.parse::<Plan>()?;
        }
        Ok(())
    }

    pub fn into_new_listing(self, slug: String) -> Listing {
        let now = Utc::now();
        let categories = non_empty(self.category).into_iter().collect();
        Listing {
            id: Uuid::new_v4(),
            slug,
            listing_name: self.listing_name.trim().to_string(),
            website: normalize_url(self.website),
            email: non_empty(self.email),
            phone: non_empty(self.phone),
            city: non_empty(self.city),
            state: non_empty(self.state),
            zip: None,
            region: self.region.as_deref().map(split_list).unwrap_or_default(),
            categories,
            age_range: self.age_tags.as_deref().map(split_list).unwrap_or_default(),
            what_you_offer: non_empty(self.what_you_offer),
            who_is_it_for: None,
            why_is_it_unique: None,
            format: self.format.into_iter().collect(),
            extras_notes: None,
            profile_image: None,
            gallery: Vec::new(),
            social_links: self.social_links.normalized(),
            ca_permit_required: false,
            is_bonded: false,
            bond_number: None,
            plan: non_empty(self.plan)
                .and_then(|p| p.parse::<Plan>().ok())
                .map(|p| p.label().to_string()),
            status: self.status,
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
}

/// Full admin edit of any listing regardless of ownership
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdminUpdateListingRequest {
    #[validate(length(min = 1, message = "Listing name is required."))]
    pub listing_name: String,
    pub status: ListingStatus,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub what_you_offer: Option<String>,
    pub who_is_it_for: Option<String>,
    pub why_is_it_unique: Option<String>,
    #[serde(default)]
    pub format: OneOrMany<ServiceFormat>,
    pub extras_notes: Option<String>,
    pub is_claimed: bool,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub plan: Option<String>,
    pub is_active: bool,
    pub featured: Option<bool>,
    pub comped: Option<bool>,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<GalleryEntry>,
    pub is_approved_101: Option<bool>,
    pub ca_permit_required: Option<bool>,
    pub is_bonded: Option<bool>,
    pub bond_number: Option<String>,
    #[serde(default)]
    pub categories: OneOrMany<String>,
    #[serde(default)]
    pub age_range: OneOrMany<String>,
    #[serde(default)]
    pub region: OneOrMany<String>,
    #[serde(flatten)]
    pub social_links: SocialLinks,
}

impl AdminUpdateListingRequest {
    /// Cross-field rules, including the requirements for going Live.
    pub fn validate_business_rules(&self) -> Result<(), String> {
        check_optional_url("website", &self.website)?;
        check_optional_email(&self.email)?;
        self.social_links.clone().normalized().check_urls()?;

        if let Some(zip) = non_empty(self.zip.clone()) {
            if !is_valid_zip(&zip) {
                return Err("zip: ZIP code must be 5 digits".into());
            }
        }

        if self.is_bonded.unwrap_or(false) && non_empty(self.bond_number.clone()).is_none() {
            return Err(
                "bond_number: Bond number is required when 'Bonded for Advanced Fees' is enabled."
                    .into(),
            );
        }

        if self.status == ListingStatus::Live {
            if !self.is_active {
                return Err("is_active: Listing must be marked Active to go Live.".into());
            }
            if non_empty(self.email.clone()).is_none() {
                return Err("email: Email is required for Live listings.".into());
            }

            let is_free = self
                .plan
                .as_deref()
                .map(|p| p.trim().eq_ignore_ascii_case("free"))
                .unwrap_or(true);
            if !is_free && non_empty(self.profile_image.clone()).is_none() {
                return Err(
                    "profile_image: Profile image is required for Live listings on Standard/Pro plans."
                        .into(),
                );
            }

            let online_only = matches!(&self.format, OneOrMany::One(ServiceFormat::Online))
                || matches!(&self.format, OneOrMany::Many(f) if f.as_slice() == [ServiceFormat::Online]);
            if !online_only {
                if non_empty(self.city.clone()).is_none() {
                    return Err(
                        "city: City is required for Live listings (except online-only).".into(),
                    );
                }
                if non_empty(self.state.clone()).is_none() {
                    return Err(
                        "state: State is required for Live listings (except online-only).".into(),
                    );
                }
            }
        }

        Ok(())
    }

    pub fn apply_to_existing(self, existing: &mut Listing) {
        existing.listing_name = self.listing_name.trim().to_string();
        existing.status = self.status;
        existing.website = normalize_url(self.website);
        existing.email = non_empty(self.email);
        existing.phone = non_empty(self.phone);
        existing.what_you_offer = non_empty(self.what_you_offer);
        existing.who_is_it_for = non_empty(self.who_is_it_for);
        existing.why_is_it_unique = non_empty(self.why_is_it_unique);
        existing.format = self.format.into_vec();
        existing.extras_notes = non_empty(self.extras_notes);
        existing.is_claimed = self.is_claimed;
        existing.city = non_empty(self.city);
        existing.state = non_empty(self.state);
        existing.zip = non_empty(self.zip);
        existing.plan = non_empty(self.plan);
        existing.is_active = self.is_active;
        if let Some(featured) = self.featured {
            existing.featured = featured;
        }
        if let Some(comped) = self.comped {
            existing.comped = comped;
        }
        existing.profile_image = non_empty(self.profile_image);
        existing.gallery = gallery_from_entries(self.gallery);
        if let Some(approved) = self.is_approved_101 {
            existing.is_approved_101 = approved;
        }
        if let Some(permit) = self.ca_permit_required {
            existing.ca_permit_required = permit;
        }
        if let Some(bonded) = self.is_bonded {
            existing.is_bonded = bonded;
        }
        existing.bond_number = non_empty(self.bond_number);
        existing.categories = self.categories.into_list();
        existing.age_range = self.age_range.into_list();
        existing.region = self.region.into_list();
        existing.social_links = self.social_links.normalized();
        existing.updated_at = Utc::now();
    }
}

/// Comped toggle from the moderation table
#[derive(Debug, Deserialize)]
pub struct CompedRequest {
    pub comped: bool,
}

/// Badge wizard state saved by the vendor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgeDraftRequest {
    pub business_info: Option<BusinessInfo>,
    pub testimonials: Option<Vec<String>>,
    #[serde(alias = "industry_references")]
    pub references: Option<Vec<String>>,
    pub credentials: Option<Vec<String>>,
}

impl BadgeDraftRequest {
    pub fn apply_to_existing(self, existing: &mut BadgeApplication) {
        if let Some(info) = self.business_info {
            existing.business_info = Some(info);
        }
        if let Some(testimonials) = self.testimonials {
            existing.testimonials = clean_urls(testimonials);
        }
        if let Some(references) = self.references {
            existing.industry_references = clean_urls(references);
        }
        if let Some(credentials) = self.credentials {
            existing.credentials = clean_urls(credentials);
        }
        existing.updated_at = Utc::now();
    }
}

/// Admin decision on a badge application
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgeReviewRequest {
    pub admin_notes: Option<String>,
}

// ============================================================================
// QUERIES AND VIEWS
// ============================================================================

/// Moderation table filters (`?status=Pending&q=...`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminListingsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub live: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminListingsView {
    pub listings: Vec<Listing>,
    pub counts: StatusCounts,
    pub total: usize,
}

/// Admin dashboard insight counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub counts: StatusCounts,
    pub high_visibility_free: usize,
    pub monetizable_pro: usize,
    pub comped: usize,
    pub claimed: usize,
}

/// Public directory filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryQuery {
    pub q: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub category: Option<String>,
}

/// Listing as rendered for a given viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicListingView {
    #[serde(flatten)]
    pub listing: Listing,
    pub tier: ListingTier,
    pub capabilities: plan::Capabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPage {
    pub category: crate::clients::Category,
    pub listings: Vec<PublicListingView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeApplicationView {
    pub application: BadgeApplication,
    pub progress: crate::services::badges::WizardProgress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStats {
    pub total: usize,
    pub submitted: usize,
    pub approved: usize,
    pub draft: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeReviewList {
    pub applications: Vec<BadgeApplicationSummary>,
    pub stats: BadgeStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BadgeReviewQuery {
    pub status: Option<BadgeApplicationStatus>,
}

// ============================================================================
// NORMALISATION HELPERS
// ============================================================================

/// Trims and maps blank strings to `None`.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Blank → `None`; a value without a scheme gets `https://`.
pub fn normalize_url(value: Option<String>) -> Option<String> {
    non_empty(value).map(|url| {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            url
        } else {
            format!("https://{url}")
        }
    })
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn clean_urls(urls: Vec<String>) -> Vec<String> {
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect()
}

fn is_valid_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit())
}

fn check_optional_url(field: &str, value: &Option<String>) -> Result<(), String> {
    match normalize_url(value.clone()) {
        Some(url) if !url.validate_url() => Err(format!("{field}: Invalid URL format.")),
        _ => Ok(()),
    }
}

fn check_optional_email(value: &Option<String>) -> Result<(), String> {
    match non_empty(value.clone()) {
        Some(email) if !email.validate_email() => Err("email: Invalid email format.".into()),
        _ => Ok(()),
    }
}
