use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::{HistoryStore, PeerSource, ProfileStore},
    error::AppResult,
    models::{HistoryRecord, UserPreferenceProfile},
};

const PROFILE_COLUMNS: &str = "user_id, book_interests, movie_interests, podcast_interests, \
     tv_show_interests, brand_interests, age_group, gender, favorite_books, favorite_movies, \
     favorite_podcasts, favorite_tv_shows, favorite_brands";

const HISTORY_COLUMNS: &str = "id, user_id, entity_id, entity_type, recommendation_type, \
     relevance_score, explanation, created_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("PostgreSQL pool established and migrations applied");

    Ok(pool)
}

/// Postgres-backed profile, peer and history store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserPreferenceProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1");
        let profile = sqlx::query_as::<_, UserPreferenceProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }
}

#[async_trait::async_trait]
impl PeerSource for PgStore {
    async fn sample_peers(
        &self,
        subject: Uuid,
        limit: usize,
    ) -> AppResult<Vec<UserPreferenceProfile>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id <> $1 LIMIT $2"
        );
        let peers = sqlx::query_as::<_, UserPreferenceProfile>(&sql)
            .bind(subject)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(peers)
    }
}

#[async_trait::async_trait]
impl HistoryStore for PgStore {
    async fn append(&self, records: &[HistoryRecord]) -> AppResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO recommendation_history ({HISTORY_COLUMNS}) "));
        builder.push_values(records, |mut row, record| {
            row.push_bind(record.id)
                .push_bind(record.user_id)
                .push_bind(&record.entity_id)
                .push_bind(&record.entity_type)
                .push_bind(&record.recommendation_type)
                .push_bind(record.relevance_score)
                .push_bind(&record.explanation)
                .push_bind(record.created_at);
        });
        builder.build().execute(&self.pool).await?;

        Ok(())
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<HistoryRecord>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM recommendation_history \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
        );
        let records = sqlx::query_as::<_, HistoryRecord>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
