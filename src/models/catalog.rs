use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::{GoodreadsRating, ImdbRating, ItunesRating, MetacriticRating};

// ============================================================================
// Taste-graph catalog API types
// ============================================================================

/// Envelope of the catalog `insights` endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Option<InsightsResults>,
}

/// Entities are kept raw so a single malformed entity can be skipped without
/// losing the rest of the page.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsResults {
    #[serde(default)]
    pub entities: Vec<Value>,
}

/// Raw catalog entity
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntity {
    pub entity_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub properties: EntityProperties,
    #[serde(default)]
    pub tags: Vec<EntityTag>,
    #[serde(default)]
    pub external: ExternalBlocks,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityProperties {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub image: Option<EntityImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntityTag {
    #[serde(default, alias = "tag_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// External rating blocks keyed by source. The catalog sends each block as a
/// list, occasionally as a bare object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExternalBlocks {
    #[serde(default)]
    pub goodreads: Option<OneOrMany<GoodreadsRating>>,
    #[serde(default)]
    pub imdb: Option<OneOrMany<ImdbRating>>,
    #[serde(default)]
    pub metacritic: Option<OneOrMany<MetacriticRating>>,
    #[serde(default)]
    pub itunes: Option<OneOrMany<ItunesRating>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    /// First block, if any
    pub fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(items) => items.into_iter().next(),
        }
    }
}

/// Accepts a number, a numeric string, or null
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|n| n.is_finite()))
}

/// Accepts an integer, a whole float, a numeric string, or null
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }))
}
