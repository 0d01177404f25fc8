use std::{borrow::Cow, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    postgres::{PgArguments, PgConnectOptions, PgPoolOptions},
    query::QueryAs,
    types::Json,
    Connection, Executor, PgPool, Postgres,
};
use uuid::Uuid;

use super::{BadgeApplicationStore, ListingStore, StoreError};
use crate::models::{
    BadgeApplication, BadgeApplicationStatus, BadgeApplicationSummary, Listing, ListingStatus,
};

macro_rules! listing_columns {
    () => {
        r#"
            id, slug, listing_name, website, email, phone, city, state, zip,
            region, categories, age_range, what_you_offer, who_is_it_for,
            why_is_it_unique, format, extras_notes, profile_image, gallery,
            social_links, ca_permit_required, is_bonded, bond_number, plan,
            status, is_active, is_claimed, comped, is_approved_101,
            badge_approved, featured, owner_id, claimed_by_email, date_claimed,
            created_at, updated_at
        "#
    };
}

macro_rules! badge_columns {
    () => {
        r#"
            id, vendor_id, business_info, testimonials, industry_references,
            credentials, status, admin_notes, created_at, updated_at
        "#
    };
}

type ListingQuery<'q> = QueryAs<'q, Postgres, Listing, PgArguments>;

/// Binds `$2..=$34` (slug through date_claimed) in column order.
fn bind_listing_fields<'q>(query: ListingQuery<'q>, listing: &'q Listing) -> ListingQuery<'q> {
    query
        .bind(&listing.slug)
        .bind(&listing.listing_name)
        .bind(&listing.website)
        .bind(&listing.email)
        .bind(&listing.phone)
        .bind(&listing.city)
        .bind(&listing.state)
        .bind(&listing.zip)
        .bind(&listing.region)
        .bind(&listing.categories)
        .bind(&listing.age_range)
        .bind(&listing.what_you_offer)
        .bind(&listing.who_is_it_for)
        .bind(&listing.why_is_it_unique)
        .bind(Json(&listing.format))
        .bind(&listing.extras_notes)
        .bind(&listing.profile_image)
        .bind(Json(&listing.gallery))
        .bind(Json(&listing.social_links))
        .bind(listing.ca_permit_required)
        .bind(listing.is_bonded)
        .bind(&listing.bond_number)
        .bind(&listing.plan)
        .bind(listing.status)
        .bind(listing.is_active)
        .bind(listing.is_claimed)
        .bind(listing.comped)
        .bind(listing.is_approved_101)
        .bind(listing.badge_approved)
        .bind(listing.featured)
        .bind(listing.owner_id)
        .bind(&listing.claimed_by_email)
        .bind(listing.date_claimed)
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = match pool_options().connect(database_url).await {
            Ok(pool) => pool,
            Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("3D000")) => {
                log::info!("Database missing, attempting to create it");
                create_database_if_missing(database_url).await?;
                pool_options().connect(database_url).await?
            }
            Err(err) => return Err(err),
        };

        // Run embedded migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Some(Duration::from_secs(600)))
        .test_before_acquire(true)
}

// ============================================================================
// LISTINGS
// ============================================================================

#[async_trait]
impl ListingStore for Database {
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, StoreError> {
        let query = sqlx::query_as::<_, Listing>(concat!(
            r#"
            INSERT INTO listings ("#,
            listing_columns!(),
            r#")
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                $31, $32, $33, $34, $35, $36
            )
            RETURNING "#,
            listing_columns!()
        ))
        .bind(listing.id);

        let record = bind_listing_fields(query, &listing)
            .bind(listing.created_at)
            .bind(listing.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(record)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, StoreError> {
        let record = sqlx::query_as::<_, Listing>(concat!(
            "SELECT ",
            listing_columns!(),
            " FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_listing_by_slug(&self, slug: &str) -> Result<Option<Listing>, StoreError> {
        let record = sqlx::query_as::<_, Listing>(concat!(
            "SELECT ",
            listing_columns!(),
            " FROM listings WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM listings WHERE slug = $1)",
        )
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_listings(&self) -> Result<Vec<Listing>, StoreError> {
        let records = sqlx::query_as::<_, Listing>(concat!(
            "SELECT ",
            listing_columns!(),
            " FROM listings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn list_listings_for_owner(&self, owner_id: Uuid) -> Result<Vec<Listing>, StoreError> {
        let records = sqlx::query_as::<_, Listing>(concat!(
            "SELECT ",
            listing_columns!(),
            " FROM listings WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn update_listing(
        &self,
        listing: &Listing,
        live_snapshot: Option<&Listing>,
    ) -> Result<Listing, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = sqlx::query_as::<_, Listing>(concat!(
            r#"
            UPDATE listings
            SET slug = $2,
                listing_name = $3,
                website = $4,
                email = $5,
                phone = $6,
                city = $7,
                state = $8,
                zip = $9,
                region = $10,
                categories = $11,
                age_range = $12,
                what_you_offer = $13,
                who_is_it_for = $14,
                why_is_it_unique = $15,
                format = $16,
                extras_notes = $17,
                profile_image = $18,
                gallery = $19,
                social_links = $20,
                ca_permit_required = $21,
                is_bonded = $22,
                bond_number = $23,
                plan = $24,
                status = $25,
                is_active = $26,
                is_claimed = $27,
                comped = $28,
                is_approved_101 = $29,
                badge_approved = $30,
                featured = $31,
                owner_id = $32,
                claimed_by_email = $33,
                date_claimed = $34,
                updated_at = $35
            WHERE id = $1
            RETURNING "#,
            listing_columns!()
        ))
        .bind(listing.id);

        let record = bind_listing_fields(query, listing)
            .bind(listing.updated_at)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or(StoreError::NotFound)?;

        if let Some(snapshot) = live_snapshot {
            sqlx::query(
                r#"
                INSERT INTO listing_live_snapshots (listing_id, snapshot, captured_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (listing_id)
                DO UPDATE SET snapshot = EXCLUDED.snapshot, captured_at = EXCLUDED.captured_at
                "#,
            )
            .bind(record.id)
            .bind(Json(snapshot))
            .bind(Utc::now())
            .execute(tx.as_mut())
            .await?;
        }

        if record.status != ListingStatus::Pending {
            clear_snapshot(&mut tx, record.id).await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn set_status(&self, id: Uuid, status: ListingStatus) -> Result<Listing, StoreError> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, Listing>(concat!(
            "UPDATE listings SET status = $2 WHERE id = $1 RETURNING ",
            listing_columns!()
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or(StoreError::NotFound)?;

        if status != ListingStatus::Pending {
            clear_snapshot(&mut tx, id).await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    async fn set_comped(&self, id: Uuid, comped: bool) -> Result<Listing, StoreError> {
        let record = sqlx::query_as::<_, Listing>(concat!(
            "UPDATE listings SET comped = $2 WHERE id = $1 RETURNING ",
            listing_columns!()
        ))
        .bind(id)
        .bind(comped)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(record)
    }

    async fn set_badge_approved_for_owner(&self, owner_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE listings SET badge_approved = TRUE, updated_at = NOW() WHERE owner_id = $1",
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn live_snapshot(&self, listing_id: Uuid) -> Result<Option<Listing>, StoreError> {
        let snapshot = sqlx::query_scalar::<_, Json<Listing>>(
            "SELECT snapshot FROM listing_live_snapshots WHERE listing_id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot.map(|Json(listing)| listing))
    }

    async fn list_live_snapshots(&self) -> Result<Vec<Listing>, StoreError> {
        let snapshots = sqlx::query_scalar::<_, Json<Listing>>(
            r#"
            SELECT s.snapshot
            FROM listing_live_snapshots s
            JOIN listings l ON l.id = s.listing_id
            WHERE l.status = 'Pending'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots.into_iter().map(|Json(listing)| listing).collect())
    }
}

async fn clear_snapshot(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    listing_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM listing_live_snapshots WHERE listing_id = $1")
        .bind(listing_id)
        .execute(tx.as_mut())
        .await?;
    Ok(())
}

// ============================================================================
// BADGE APPLICATIONS
// ============================================================================

#[async_trait]
impl BadgeApplicationStore for Database {
    async fn get_application(&self, id: Uuid) -> Result<Option<BadgeApplication>, StoreError> {
        let record = sqlx::query_as::<_, BadgeApplication>(concat!(
            "SELECT ",
            badge_columns!(),
            " FROM vendor_badge_applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_application_for_vendor(
        &self,
        vendor_id: Uuid,
    ) -> Result<Option<BadgeApplication>, StoreError> {
        let record = sqlx::query_as::<_, BadgeApplication>(concat!(
            "SELECT ",
            badge_columns!(),
            " FROM vendor_badge_applications WHERE vendor_id = $1"
        ))
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert_application(
        &self,
        application: &BadgeApplication,
    ) -> Result<BadgeApplication, StoreError> {
        let record = sqlx::query_as::<_, BadgeApplication>(concat!(
            r#"
            INSERT INTO vendor_badge_applications ("#,
            badge_columns!(),
            r#")
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (vendor_id) DO UPDATE
            SET business_info = EXCLUDED.business_info,
                testimonials = EXCLUDED.testimonials,
                industry_references = EXCLUDED.industry_references,
                credentials = EXCLUDED.credentials,
                status = EXCLUDED.status,
                admin_notes = EXCLUDED.admin_notes,
                updated_at = EXCLUDED.updated_at
            RETURNING "#,
            badge_columns!()
        ))
        .bind(application.id)
        .bind(application.vendor_id)
        .bind(Json(&application.business_info))
        .bind(&application.testimonials)
        .bind(&application.industry_references)
        .bind(&application.credentials)
        .bind(application.status)
        .bind(&application.admin_notes)
        .bind(application.created_at)
        .bind(application.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_applications(
        &self,
        status: Option<BadgeApplicationStatus>,
    ) -> Result<Vec<BadgeApplicationSummary>, StoreError> {
        let records = sqlx::query_as::<_, BadgeApplicationSummary>(
            r#"
            SELECT
                a.id,
                a.vendor_id,
                a.business_info,
                a.testimonials,
                a.industry_references,
                a.credentials,
                a.status,
                a.admin_notes,
                a.created_at,
                a.updated_at,
                l.listing_name,
                l.categories
            FROM vendor_badge_applications a
            LEFT JOIN LATERAL (
                SELECT listing_name, categories
                FROM listings
                WHERE owner_id = a.vendor_id
                ORDER BY created_at ASC
                LIMIT 1
            ) l ON TRUE
            WHERE ($1::badge_application_status IS NULL OR a.status = $1)
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn review_application(
        &self,
        id: Uuid,
        status: BadgeApplicationStatus,
        admin_notes: Option<String>,
    ) -> Result<BadgeApplication, StoreError> {
        let record = sqlx::query_as::<_, BadgeApplication>(concat!(
            r#"
            UPDATE vendor_badge_applications
            SET status = $2, admin_notes = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            badge_columns!()
        ))
        .bind(id)
        .bind(status)
        .bind(admin_notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(record)
    }
}

async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    let options: PgConnectOptions = database_url.parse()?;
    let database_name = options
        .get_database()
        .map(|name| name.to_string())
        .unwrap_or_else(|| "postgres".to_string());

    // Already on the maintenance database.
    if database_name.eq_ignore_ascii_case("postgres") {
        return Ok(());
    }

    let maintenance_options = options.clone().database("postgres");
    let mut connection = sqlx::postgres::PgConnection::connect_with(&maintenance_options).await?;

    let escaped_name = database_name.replace('"', "\"\"");
    let create_stmt = format!("CREATE DATABASE \"{escaped_name}\"");

    match connection.execute(create_stmt.as_str()).await {
        Ok(_) => {
            log::info!("Created database '{database_name}'");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code() == Some(Cow::Borrowed("42P04")) => {
            log::info!("Database '{database_name}' already exists");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
