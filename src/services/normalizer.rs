use crate::models::{
    CatalogEntity, Domain, ExternalRatings, InsightsResponse, Recommendation, RecommendationType,
};

/// Why a catalog payload could not be turned into entities
#[derive(thiserror::Error, Debug)]
pub enum NormalizationError {
    #[error("Malformed catalog payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Catalog reported an unsuccessful query")]
    Unsuccessful,

    #[error("Catalog payload has no results block")]
    MissingResults,
}

/// Parses an `insights` response body into catalog entities.
///
/// Entities that fail to deserialize individually are skipped; only envelope
/// problems are errors.
pub fn parse_insights(raw: &str) -> Result<Vec<CatalogEntity>, NormalizationError> {
    let response: InsightsResponse = serde_json::from_str(raw)?;
    if !response.success {
        return Err(NormalizationError::Unsuccessful);
    }
    let results = response
        .results
        .ok_or(NormalizationError::MissingResults)?;

    let total = results.entities.len();
    let entities: Vec<CatalogEntity> = results
        .entities
        .into_iter()
        .filter_map(|value| serde_json::from_value::<CatalogEntity>(value).ok())
        .collect();

    if entities.len() < total {
        tracing::debug!(
            skipped = total - entities.len(),
            kept = entities.len(),
            "Skipped malformed catalog entities"
        );
    }

    Ok(entities)
}

/// Converts a raw catalog entity into an unscored recommendation.
///
/// Rating blocks are picked by domain: Goodreads for books, IMDB and
/// Metacritic for movies, iTunes for podcasts. Other domains carry none.
pub fn normalize(entity: CatalogEntity, domain: Domain) -> Recommendation {
    let CatalogEntity {
        entity_id,
        name,
        popularity,
        properties,
        tags,
        external,
    } = entity;

    let mut external_ratings = ExternalRatings::default();
    match domain {
        Domain::Books => {
            external_ratings.goodreads = external.goodreads.and_then(|b| b.into_first());
        }
        Domain::Movies => {
            external_ratings.imdb = external.imdb.and_then(|b| b.into_first());
            external_ratings.metacritic = external.metacritic.and_then(|b| b.into_first());
        }
        Domain::Podcasts => {
            external_ratings.itunes = external.itunes.and_then(|b| b.into_first());
        }
        Domain::TvShows | Domain::Brands => {}
    }

    let description = properties
        .description
        .or(properties.short_description)
        .unwrap_or_default();

    let mut tag_names: Vec<String> = Vec::new();
    for tag in tags.into_iter().filter_map(|t| t.name) {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tag_names.contains(&tag) {
            tag_names.push(tag);
        }
    }

    Recommendation {
        entity_id,
        entity_type: domain,
        title: name,
        description,
        tags: tag_names,
        popularity: popularity.unwrap_or(0.0),
        image_url: properties.image.and_then(|i| i.url),
        external_ratings,
        relevance_score: 0.0,
        explanation: String::new(),
        recommendation_type: RecommendationType::UserBased,
    }
}
