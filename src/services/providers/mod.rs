/// Taste-graph catalog abstraction
///
/// The recommendation pipeline only needs one capability from the catalog:
/// "give me entities of this domain carrying this tag". Providers implement
/// that over HTTP; tests implement it with scripted responses.
use crate::{
    models::{CatalogEntity, Domain, UserPreferenceProfile},
    services::normalizer::NormalizationError,
};

pub mod qloo;

pub use qloo::QlooProvider;

/// Age bucket used whenever demographic signal is unavailable or untrusted
pub const DEFAULT_AGE_BUCKET: &str = "35_and_younger";

/// Demographic signals accepted by the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Demographics {
    pub age: Option<String>,
    pub gender: Option<String>,
}

impl Demographics {
    /// Maps a profile's free-text demographics onto catalog buckets.
    ///
    /// Unrecognized values are dropped rather than guessed.
    pub fn from_profile(profile: &UserPreferenceProfile) -> Self {
        Self {
            age: profile.age_group.as_deref().and_then(age_bucket),
            gender: profile
                .gender
                .as_deref()
                .map(|g| g.trim().to_lowercase())
                .filter(|g| g == "male" || g == "female"),
        }
    }

    /// Fixed signal used by the emergency tier
    pub fn emergency_default() -> Self {
        Self {
            age: Some(DEFAULT_AGE_BUCKET.to_string()),
            gender: None,
        }
    }
}

fn age_bucket(raw: &str) -> Option<String> {
    let raw = raw.trim().to_lowercase();
    match raw.as_str() {
        "35_and_younger" | "36_to_55" | "55_and_older" => return Some(raw),
        _ => {}
    }

    // "18-24", "25 - 34", "55+", "under 18": bucket by the lowest age mentioned
    let lowest = raw
        .split(|c: char| !c.is_ascii_digit())
        .filter_map(|part| part.parse::<u32>().ok())
        .min()?;

    let bucket = match lowest {
        0..=35 => "35_and_younger",
        36..=54 => "36_to_55",
        _ => "55_and_older",
    };
    Some(bucket.to_string())
}

/// One (domain, genre) catalog query
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub domain: Domain,
    /// Canonical catalog tag
    pub tag: String,
    pub demographics: Demographics,
    /// Upper bound on returned entities
    pub take: u32,
    /// Randomized pagination offset
    pub offset: u32,
}

/// Failures inside a catalog call. They never cross the provider boundary.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog request timed out")]
    Timeout,

    #[error("Catalog returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Payload(#[from] NormalizationError),
}

/// Trait for taste-graph catalog providers
///
/// `query` is infallible by contract: transport errors, non-2xx statuses,
/// timeouts and malformed payloads are logged by the provider and reported as
/// an empty list.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn query(&self, query: &CatalogQuery) -> Vec<CatalogEntity>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
