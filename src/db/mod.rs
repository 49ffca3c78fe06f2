use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{HistoryRecord, UserPreferenceProfile},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Read access to stored user preference profiles
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserPreferenceProfile>>;
}

/// Supplies the peer set for friend-based recommendations.
///
/// Today any other users qualify; a social-graph backed source can replace
/// this without touching the cascade or scorer.
#[async_trait::async_trait]
pub trait PeerSource: Send + Sync {
    async fn sample_peers(
        &self,
        subject: Uuid,
        limit: usize,
    ) -> AppResult<Vec<UserPreferenceProfile>>;
}

/// Append-only recommendation history
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, records: &[HistoryRecord]) -> AppResult<()>;

    /// Most recent records for a user, newest first
    async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<HistoryRecord>>;
}
