use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{HistoryStore, PeerSource, ProfileStore},
    error::AppResult,
    models::{HistoryRecord, UserPreferenceProfile},
};

/// In-process store for local runs and tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Insertion order is the peer sampling order
    profiles: Vec<UserPreferenceProfile>,
    history: Vec<HistoryRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a profile, replacing any existing one for the same user
    pub async fn upsert_profile(&self, profile: UserPreferenceProfile) {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .profiles
            .iter_mut()
            .find(|p| p.user_id == profile.user_id)
        {
            *existing = profile;
        } else {
            inner.profiles.push(profile);
        }
    }

    /// Total history records across users
    pub async fn history_len(&self) -> usize {
        self.inner.read().await.history.len()
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserPreferenceProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }
}

#[async_trait::async_trait]
impl PeerSource for MemoryStore {
    async fn sample_peers(
        &self,
        subject: Uuid,
        limit: usize,
    ) -> AppResult<Vec<UserPreferenceProfile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .iter()
            .filter(|p| p.user_id != subject)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, records: &[HistoryRecord]) -> AppResult<()> {
        self.inner.write().await.history.extend_from_slice(records);
        Ok(())
    }

    async fn recent_for_user(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<HistoryRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<HistoryRecord> = inner
            .history
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}
