/// Qloo taste-graph provider
///
/// Issues one `insights` query per (domain, genre) pair:
/// `GET /v2/insights?filter.type=<entity type>&signal.interests.tags=<tag>&...`
///
/// Every failure mode (transport, timeout, non-2xx, malformed or unsuccessful
/// payload) is logged here and surfaces to callers as an empty entity list.
use std::{sync::Arc, time::Duration};

use reqwest::Client as HttpClient;
use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult},
    models::CatalogEntity,
    services::{
        normalizer::parse_insights,
        providers::{CatalogError, CatalogProvider, CatalogQuery},
    },
};

const INSIGHTS_PATH: &str = "/v2/insights";
const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone)]
pub struct QlooProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    /// Bounds in-flight catalog calls across all concurrent requests
    permits: Arc<Semaphore>,
}

impl QlooProvider {
    /// Creates a provider with a per-call timeout and a concurrency bound
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
        max_concurrency: usize,
    ) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("Catalog API key is missing".to_string()));
        }

        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        })
    }

    /// Query-string pairs for one catalog query
    fn query_params(query: &CatalogQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("filter.type", query.domain.entity_type().to_string()),
            ("signal.interests.tags", query.tag.clone()),
            ("take", query.take.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(age) = &query.demographics.age {
            params.push(("signal.demographics.age", age.clone()));
        }
        if let Some(gender) = &query.demographics.gender {
            params.push(("signal.demographics.gender", gender.clone()));
        }
        params
    }

    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntity>, CatalogError> {
        let Ok(_permit) = self.permits.acquire().await else {
            return Ok(Vec::new());
        };

        let url = format!("{}{}", self.api_url, INSIGHTS_PATH);
        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&Self::query_params(query))
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status { status, body });
        }

        let body = response.text().await.map_err(classify)?;
        Ok(parse_insights(&body)?)
    }
}

fn classify(error: reqwest::Error) -> CatalogError {
    if error.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Http(error)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for QlooProvider {
    async fn query(&self, query: &CatalogQuery) -> Vec<CatalogEntity> {
        match self.fetch(query).await {
            Ok(entities) => {
                tracing::debug!(
                    domain = %query.domain,
                    tag = %query.tag,
                    offset = query.offset,
                    results = entities.len(),
                    provider = self.name(),
                    "Catalog query completed"
                );
                entities
            }
            Err(e) => {
                tracing::warn!(
                    domain = %query.domain,
                    tag = %query.tag,
                    error = %e,
                    provider = self.name(),
                    "Catalog query failed; treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "qloo"
    }
}
