use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::SubjectId,
    models::{Domain, HistoryRecord, Recommendation, RequestType},
    services::{recommendations::DEFAULT_LIMIT, RecommendationRequest},
};

use super::AppState;

pub const MAX_LIMIT: usize = 50;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const MAX_HISTORY_LIMIT: usize = 100;

// Request/Response types

/// Raw query string; parsed by hand so bad values surface as JSON errors
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub domains: Option<String>,
    pub limit: Option<String>,
}

impl RecommendationParams {
    pub fn into_request(self) -> AppResult<RecommendationRequest> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") => RequestType::default(),
            Some(raw) => raw
                .parse()
                .map_err(|bad| AppError::InvalidInput(format!("Unknown type: {}", bad)))?,
        };

        let domains = Domain::parse_list(self.domains.as_deref().unwrap_or_default())
            .map_err(|bad| AppError::InvalidInput(format!("Unknown domain: {}", bad)))?;

        let limit = parse_limit(self.limit.as_deref(), DEFAULT_LIMIT, MAX_LIMIT)?;

        Ok(RecommendationRequest {
            kind,
            domains,
            limit,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: RequestType,
    pub domains: Vec<Domain>,
    pub recommendations: Vec<Recommendation>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryRecord>,
    pub total: usize,
}

/// Parses an optional limit and clamps it into `1..=max`
fn parse_limit(raw: Option<&str>, default: usize, max: usize) -> AppResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid limit: {}", raw)))?;

    Ok(value.clamp(1, max as i64) as usize)
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Recommendations for the calling subject
pub async fn get_recommendations(
    State(state): State<AppState>,
    SubjectId(user_id): SubjectId,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<RecommendationsResponse>> {
    let request = params.into_request()?;
    let recommendations = state.engine.recommend(user_id, &request).await?;

    Ok(Json(RecommendationsResponse {
        success: true,
        kind: request.kind,
        domains: request.domains,
        total: recommendations.len(),
        recommendations,
    }))
}

/// Most recent recommendations served to the calling subject
pub async fn get_history(
    State(state): State<AppState>,
    SubjectId(user_id): SubjectId,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<HistoryResponse>> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT)?;
    let history = state.history.recent_for_user(user_id, limit).await?;

    Ok(Json(HistoryResponse {
        success: true,
        total: history.len(),
        history,
    }))
}
