use chrono::Utc;

use crate::database::{ListingStore, StoreError};

const MAX_SUFFIX_ATTEMPTS: u32 = 100;

/// URL-safe slug from a listing name.
///
/// Lowercases, turns whitespace runs into `-`, drops anything outside
/// `[a-z0-9-]`, collapses dashes and trims them from both ends.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
            continue;
        }
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit()) {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(ch);
    }

    slug
}

/// Slug that no stored listing uses yet.
pub async fn unique_slug(store: &dyn ListingStore, name: &str) -> Result<String, StoreError> {
    let mut base = generate_slug(name);
    if base.is_empty() {
        base = format!("listing-{}", Utc::now().timestamp_millis());
    }

    if !store.slug_exists(&base).await? {
        return Ok(base);
    }

    for counter in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = format!("{base}-{counter}");
        if !store.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }

    log::warn!("Slug suffixes exhausted for '{base}', falling back to timestamp");
    Ok(format!("{base}-{}", Utc::now().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::ListingStatus;
    use crate::testing::listing_named;

    #[test]
    fn slug_from_business_name() {
        assert_eq!(generate_slug("Jane Doe Photography"), "jane-doe-photography");
        assert_eq!(generate_slug("  Kids & Co. Acting -- Studio!  "), "kids-co-acting-studio");
        assert_eq!(generate_slug("Café Über 123"), "caf-ber-123");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn slug_is_idempotent_and_restricted() {
        let names = [
            "Jane Doe Photography",
            "--Lead & Trailing--",
            "Tabs\tand\nnewlines",
            "ÅÄÖ Coaching",
            "a  -  b",
        ];
        for name in names {
            let slug = generate_slug(name);
            assert_eq!(generate_slug(&slug), slug, "not idempotent for {name:?}");
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            assert!(!slug.contains("--"));
        }
    }

    #[actix_rt::test]
    async fn unique_slug_appends_counter() {
        let store = MemoryStore::new();
        assert_eq!(
            unique_slug(&store, "Jane Doe Photography").await.unwrap(),
            "jane-doe-photography"
        );

        store
            .insert_listing(listing_named("Jane Doe Photography", "Free", ListingStatus::Live))
            .await
            .unwrap();
        assert_eq!(
            unique_slug(&store, "Jane Doe Photography").await.unwrap(),
            "jane-doe-photography-1"
        );

        let mut second = listing_named("Jane Doe Photography", "Free", ListingStatus::Live);
        second.slug = "jane-doe-photography-1".into();
        store.insert_listing(second).await.unwrap();
        assert_eq!(
            unique_slug(&store, "Jane Doe Photography").await.unwrap(),
            "jane-doe-photography-2"
        );
    }

    #[actix_rt::test]
    async fn empty_slug_falls_back_to_timestamp() {
        let store = MemoryStore::new();
        let slug = unique_slug(&store, "???").await.unwrap();
        assert!(slug.starts_with("listing-"));
    }
}
