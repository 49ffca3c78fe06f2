use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

pub mod catalog;
pub mod history;
pub mod profile;

pub use catalog::{
    CatalogEntity, EntityImage, EntityProperties, EntityTag, ExternalBlocks, InsightsResponse,
    InsightsResults, OneOrMany,
};
pub use history::HistoryRecord;
pub use profile::UserPreferenceProfile;

/// One content category the catalog can be queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Books,
    Movies,
    Podcasts,
    TvShows,
    Brands,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Books,
        Domain::Movies,
        Domain::Podcasts,
        Domain::TvShows,
        Domain::Brands,
    ];

    /// Domains served when the caller does not name any
    pub fn default_set() -> Vec<Domain> {
        vec![Domain::Books, Domain::Movies, Domain::Podcasts]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Books => "books",
            Domain::Movies => "movies",
            Domain::Podcasts => "podcasts",
            Domain::TvShows => "tv_shows",
            Domain::Brands => "brands",
        }
    }

    /// Catalog `filter.type` value for this domain
    pub fn entity_type(&self) -> &'static str {
        match self {
            Domain::Books => "urn:entity:book",
            Domain::Movies => "urn:entity:movie",
            Domain::Podcasts => "urn:entity:podcast",
            Domain::TvShows => "urn:entity:tv_show",
            Domain::Brands => "urn:entity:brand",
        }
    }

    /// Human-readable plural used in explanations
    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::TvShows => "TV shows",
            other => other.as_str(),
        }
    }

    /// Parses a comma-separated domain list.
    ///
    /// Blank input yields the default set. Duplicates collapse onto their first
    /// occurrence; an unknown name is rejected with that name.
    pub fn parse_list(raw: &str) -> Result<Vec<Domain>, String> {
        let mut domains = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let domain: Domain = part.parse()?;
            if !domains.contains(&domain) {
                domains.push(domain);
            }
        }

        if domains.is_empty() {
            return Ok(Domain::default_set());
        }
        Ok(domains)
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "books" => Ok(Domain::Books),
            "movies" => Ok(Domain::Movies),
            "podcasts" => Ok(Domain::Podcasts),
            "tv_shows" => Ok(Domain::TvShows),
            "brands" => Ok(Domain::Brands),
            other => Err(other.to_string()),
        }
    }
}

/// Which pipeline produced a recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    #[default]
    UserBased,
    FriendBased,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::UserBased => "user_based",
            RecommendationType::FriendBased => "friend_based",
        }
    }
}

/// Request mode accepted by the recommendations endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    #[default]
    UserBased,
    FriendBased,
    All,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::UserBased => "user_based",
            RequestType::FriendBased => "friend_based",
            RequestType::All => "all",
        }
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user_based" => Ok(RequestType::UserBased),
            "friend_based" => Ok(RequestType::FriendBased),
            "all" => Ok(RequestType::All),
            other => Err(other.to_string()),
        }
    }
}

/// Goodreads rating block (books)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodreadsRating {
    #[serde(default, deserialize_with = "catalog::lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "catalog::lenient_u64")]
    pub rating_count: Option<u64>,
}

/// IMDB rating block (movies)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImdbRating {
    #[serde(default, deserialize_with = "catalog::lenient_f64")]
    pub user_rating: Option<f64>,
    #[serde(default, deserialize_with = "catalog::lenient_u64")]
    pub user_rating_count: Option<u64>,
}

/// Metacritic rating block (movies)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetacriticRating {
    #[serde(default, deserialize_with = "catalog::lenient_f64")]
    pub critic_rating: Option<f64>,
    #[serde(default, deserialize_with = "catalog::lenient_f64")]
    pub user_rating: Option<f64>,
}

/// iTunes rating block (podcasts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItunesRating {
    #[serde(default, deserialize_with = "catalog::lenient_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "catalog::lenient_u64")]
    pub rating_count: Option<u64>,
}

/// Domain-shaped external ratings. Absent blocks stay `None`; a zero rating is
/// a real rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalRatings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goodreads: Option<GoodreadsRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<ImdbRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<MetacriticRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itunes: Option<ItunesRating>,
}

impl ExternalRatings {
    pub fn is_empty(&self) -> bool {
        self.goodreads.is_none()
            && self.imdb.is_none()
            && self.metacritic.is_none()
            && self.itunes.is_none()
    }

    pub fn imdb_rating(&self) -> Option<f64> {
        self.imdb.as_ref().and_then(|r| r.user_rating)
    }

    pub fn goodreads_rating(&self) -> Option<f64> {
        self.goodreads.as_ref().and_then(|r| r.rating)
    }

    pub fn itunes_rating(&self) -> Option<f64> {
        self.itunes.as_ref().and_then(|r| r.rating)
    }
}

/// A single recommended catalog entity, as served to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Stable catalog identifier, used for dedup and history
    pub entity_id: String,
    pub entity_type: Domain,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Catalog popularity; only comparable within one domain
    pub popularity: f64,
    pub image_url: Option<String>,
    pub external_ratings: ExternalRatings,
    pub relevance_score: f64,
    pub explanation: String,
    #[serde(default)]
    pub recommendation_type: RecommendationType,
}
