use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Domain;

/// A user's stated preferences, as populated by the profile/onboarding flows.
///
/// Read-only here: the recommendation pipeline never mutates a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreferenceProfile {
    pub user_id: Uuid,
    #[serde(default)]
    pub book_interests: Vec<String>,
    #[serde(default)]
    pub movie_interests: Vec<String>,
    #[serde(default)]
    pub podcast_interests: Vec<String>,
    #[serde(default)]
    pub tv_show_interests: Vec<String>,
    #[serde(default)]
    pub brand_interests: Vec<String>,
    /// Free-text age range, e.g. "18-24"
    pub age_group: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub favorite_books: Vec<String>,
    #[serde(default)]
    pub favorite_movies: Vec<String>,
    #[serde(default)]
    pub favorite_podcasts: Vec<String>,
    #[serde(default)]
    pub favorite_tv_shows: Vec<String>,
    #[serde(default)]
    pub favorite_brands: Vec<String>,
}

impl UserPreferenceProfile {
    /// Creates an empty profile for a user
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Interest labels the user stated for a domain
    pub fn interests(&self, domain: Domain) -> &[String] {
        match domain {
            Domain::Books => &self.book_interests,
            Domain::Movies => &self.movie_interests,
            Domain::Podcasts => &self.podcast_interests,
            Domain::TvShows => &self.tv_show_interests,
            Domain::Brands => &self.brand_interests,
        }
    }

    /// Case-insensitive membership test against the domain's interest labels
    pub fn has_interest(&self, domain: Domain, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        self.interests(domain)
            .iter()
            .any(|l| l.trim().to_lowercase() == needle)
    }

    /// Replaces the interest labels for a domain
    pub fn with_interests<I, S>(mut self, domain: Domain, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = labels.into_iter().map(Into::into).collect();
        match domain {
            Domain::Books => self.book_interests = labels,
            Domain::Movies => self.movie_interests = labels,
            Domain::Podcasts => self.podcast_interests = labels,
            Domain::TvShows => self.tv_show_interests = labels,
            Domain::Brands => self.brand_interests = labels,
        }
        self
    }
}
