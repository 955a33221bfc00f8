use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Lead, NewLead, Profile, ProfileDraft, SurveyAnswers};

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The username `{0}` is already taken.")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Portfolio rows, keyed publicly by username and privately by owner id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Profile>>;

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Option<Profile>>;

    /// Update the owner's row if one exists, insert it otherwise.
    /// Check-then-write: two concurrent saves by one owner are not guarded against.
    async fn upsert_for_owner(&self, owner: Uuid, draft: &ProfileDraft) -> StoreResult<Profile>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert_lead(&self, lead: &NewLead) -> StoreResult<Lead>;

    /// Copy survey answers onto every lead with the same email, returning how many matched
    async fn merge_survey(&self, answers: &SurveyAnswers) -> StoreResult<u64>;
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(self.get_pool()).await?;
        Ok(())
    }

    async fn insert_profile(&self, owner: Uuid, draft: &ProfileDraft) -> StoreResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO portfolios (user_id, username, full_name, tagline, bio, city, is_available,
                                    contact_email, contact_phone, brands, stats, work_links)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(&draft.username)
        .bind(&draft.full_name)
        .bind(&draft.tagline)
        .bind(&draft.bio)
        .bind(&draft.city)
        .bind(draft.is_available)
        .bind(&draft.contact_email)
        .bind(&draft.contact_phone)
        .bind(&draft.brands)
        .bind(Json(draft.stats.clone()))
        .bind(Json(draft.work_links.clone()))
        .fetch_one(self.get_pool())
        .await
        .map_err(|e| username_conflict(e, &draft.username))?;

        Ok(profile)
    }

    async fn update_profile(&self, owner: Uuid, draft: &ProfileDraft) -> StoreResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE portfolios
            SET username = $2, full_name = $3, tagline = $4, bio = $5, city = $6,
                is_available = $7, contact_email = $8, contact_phone = $9, brands = $10,
                stats = $11, work_links = $12, updated_at = now()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(&draft.username)
        .bind(&draft.full_name)
        .bind(&draft.tagline)
        .bind(&draft.bio)
        .bind(&draft.city)
        .bind(draft.is_available)
        .bind(&draft.contact_email)
        .bind(&draft.contact_phone)
        .bind(&draft.brands)
        .bind(Json(draft.stats.clone()))
        .bind(Json(draft.work_links.clone()))
        .fetch_one(self.get_pool())
        .await
        .map_err(|e| username_conflict(e, &draft.username))?;

        Ok(profile)
    }
}

fn username_conflict(err: sqlx::Error, username: &str) -> StoreError {
    let taken = err
        .as_database_error()
        .map(|db| {
            db.is_unique_violation() && db.constraint().is_some_and(|c| c.contains("username"))
        })
        .unwrap_or(false);

    if taken {
        StoreError::UsernameTaken(username.to_string())
    } else {
        StoreError::Backend(err)
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, Profile>("SELECT * FROM portfolios WHERE username = $1")
                .bind(username)
                .fetch_optional(self.get_pool())
                .await?;

        Ok(profile)
    }

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM portfolios WHERE user_id = $1")
            .bind(owner)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(profile)
    }

    async fn upsert_for_owner(&self, owner: Uuid, draft: &ProfileDraft) -> StoreResult<Profile> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM portfolios WHERE user_id = $1")
                .bind(owner)
                .fetch_optional(self.get_pool())
                .await?;

        match existing {
            Some(_) => self.update_profile(owner, draft).await,
            None => self.insert_profile(owner, draft).await,
        }
    }
}

#[async_trait]
impl LeadStore for Database {
    async fn insert_lead(&self, lead: &NewLead) -> StoreResult<Lead> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, email, instagram, phone, niche_category, experience_level,
                               city, followers, quote_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.instagram)
        .bind(&lead.phone)
        .bind(&lead.niche_category)
        .bind(&lead.experience_level)
        .bind(&lead.city)
        .bind(&lead.followers)
        .bind(&lead.quote_price)
        .fetch_one(self.get_pool())
        .await?;

        Ok(lead)
    }

    async fn merge_survey(&self, answers: &SurveyAnswers) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE leads SET niche_category = $1, experience_level = $2 WHERE email = $3",
        )
        .bind(&answers.niche_category)
        .bind(&answers.experience_level)
        .bind(&answers.email)
        .execute(self.get_pool())
        .await?;

        Ok(result.rows_affected())
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    Ok(db)
}
