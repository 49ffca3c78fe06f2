use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Recommendation;

/// Append-only audit record of one served recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entity_id: String,
    pub entity_type: String,
    pub recommendation_type: String,
    pub relevance_score: f64,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn from_recommendation(user_id: Uuid, rec: &Recommendation) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            entity_id: rec.entity_id.clone(),
            entity_type: rec.entity_type.as_str().to_string(),
            recommendation_type: rec.recommendation_type.as_str().to_string(),
            relevance_score: rec.relevance_score,
            explanation: rec.explanation.clone(),
            created_at: Utc::now(),
        }
    }
}
