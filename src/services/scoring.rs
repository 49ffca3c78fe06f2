use std::sync::Arc;

use crate::models::{Recommendation, UserPreferenceProfile};
use crate::services::genres::GenreTagMapper;

pub const BASE_SCORE: f64 = 0.3;
pub const EXACT_MATCH_BOOST: f64 = 0.3;
pub const FUZZY_MATCH_BOOST: f64 = 0.15;
pub const POPULARITY_WEIGHT: f64 = 0.2;
pub const POPULARITY_CAP: f64 = 0.2;
pub const RATING_BOOST: f64 = 0.1;
pub const DEPTH_BOOST: f64 = 0.05;
/// Descriptions longer than this many characters earn the depth boost
pub const DEPTH_THRESHOLD: usize = 100;
pub const MIN_SCORE: f64 = 0.1;
pub const MAX_SCORE: f64 = 1.0;

const IMDB_THRESHOLD: f64 = 7.0;
const GOODREADS_THRESHOLD: f64 = 4.0;
const ITUNES_THRESHOLD: f64 = 4.0;

/// Clamps any score into the servable range
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return MIN_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Multi-factor relevance of a normalized recommendation to a profile.
///
/// Pure: the same profile and recommendation always produce the same score.
/// Exact and fuzzy label matches accumulate independently, so one label can
/// contribute to both.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    mapper: Arc<GenreTagMapper>,
}

impl RelevanceScorer {
    pub fn new(mapper: Arc<GenreTagMapper>) -> Self {
        Self { mapper }
    }

    pub fn score(&self, profile: &UserPreferenceProfile, rec: &Recommendation) -> f64 {
        let domain = rec.entity_type;
        let labels = profile.interests(domain);
        let tags: Vec<String> = rec
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let tag_words: Vec<&str> = tags.iter().flat_map(|t| t.split_whitespace()).collect();

        let mut score = BASE_SCORE;

        for label in labels {
            let label = label.trim().to_lowercase();
            if label.is_empty() {
                continue;
            }

            let mut keys = vec![label.clone()];
            if let Some(readable) = self.mapper.readable_tag(domain, &label) {
                if readable != label {
                    keys.push(readable);
                }
            }
            if keys.iter().any(|k| tags.iter().any(|t| overlaps(k, t))) {
                score += EXACT_MATCH_BOOST;
            }

            let fuzzy = label
                .split_whitespace()
                .any(|lw| tag_words.iter().any(|tw| overlaps(lw, tw)));
            if fuzzy {
                score += FUZZY_MATCH_BOOST;
            }
        }

        if rec.popularity.is_finite() {
            score += (rec.popularity * POPULARITY_WEIGHT).clamp(0.0, POPULARITY_CAP);
        }

        let ratings = &rec.external_ratings;
        if ratings.imdb_rating().is_some_and(|r| r > IMDB_THRESHOLD) {
            score += RATING_BOOST;
        }
        if ratings
            .goodreads_rating()
            .is_some_and(|r| r > GOODREADS_THRESHOLD)
        {
            score += RATING_BOOST;
        }
        if ratings.itunes_rating().is_some_and(|r| r > ITUNES_THRESHOLD) {
            score += RATING_BOOST;
        }

        if rec.description.chars().count() > DEPTH_THRESHOLD {
            score += DEPTH_BOOST;
        }

        clamp_score(score)
    }
}

/// Equal, contains, or contained-by
fn overlaps(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}
