use std::collections::HashMap;

use crate::models::Domain;

const MEDIA_GENRE: &str = "urn:tag:genre:media";
const BRAND_CATEGORY: &str = "urn:tag:category:brand";

/// (domain, human label, tag suffix). Labels are matched case-insensitively;
/// several labels may share one canonical tag.
const GENRE_TABLE: &[(Domain, &str, &str)] = &[
    // Books
    (Domain::Books, "Fiction", "fiction"),
    (Domain::Books, "Science Fiction", "science_fiction"),
    (Domain::Books, "Sci-Fi", "science_fiction"),
    (Domain::Books, "SciFi", "science_fiction"),
    (Domain::Books, "Fantasy", "fantasy"),
    (Domain::Books, "Mystery", "mystery"),
    (Domain::Books, "Thriller", "thriller"),
    (Domain::Books, "Romance", "romance"),
    (Domain::Books, "Horror", "horror"),
    (Domain::Books, "Biography", "biography"),
    (Domain::Books, "History", "history"),
    (Domain::Books, "Self-Help", "self_help"),
    (Domain::Books, "Self Help", "self_help"),
    (Domain::Books, "Young Adult", "young_adult"),
    (Domain::Books, "Poetry", "poetry"),
    (Domain::Books, "Non-Fiction", "nonfiction"),
    (Domain::Books, "Nonfiction", "nonfiction"),
    // Movies
    (Domain::Movies, "Action", "action"),
    (Domain::Movies, "Adventure", "adventure"),
    (Domain::Movies, "Animation", "animation"),
    (Domain::Movies, "Comedy", "comedy"),
    (Domain::Movies, "Drama", "drama"),
    (Domain::Movies, "Documentary", "documentary"),
    (Domain::Movies, "Fantasy", "fantasy"),
    (Domain::Movies, "Horror", "horror"),
    (Domain::Movies, "Romance", "romance"),
    (Domain::Movies, "Science Fiction", "science_fiction"),
    (Domain::Movies, "Sci-Fi", "science_fiction"),
    (Domain::Movies, "Thriller", "thriller"),
    (Domain::Movies, "Musical", "musical"),
    // Podcasts
    (Domain::Podcasts, "Comedy", "comedy"),
    (Domain::Podcasts, "News", "news"),
    (Domain::Podcasts, "True Crime", "true_crime"),
    (Domain::Podcasts, "Technology", "technology"),
    (Domain::Podcasts, "Tech", "technology"),
    (Domain::Podcasts, "Business", "business"),
    (Domain::Podcasts, "Education", "education"),
    (Domain::Podcasts, "Health", "health_fitness"),
    (Domain::Podcasts, "Fitness", "health_fitness"),
    (Domain::Podcasts, "Sports", "sports"),
    (Domain::Podcasts, "Society & Culture", "society_culture"),
    (Domain::Podcasts, "Science", "science"),
    // TV shows
    (Domain::TvShows, "Drama", "drama"),
    (Domain::TvShows, "Comedy", "comedy"),
    (Domain::TvShows, "Sitcom", "sitcom"),
    (Domain::TvShows, "Crime", "crime"),
    (Domain::TvShows, "Reality", "reality"),
    (Domain::TvShows, "Reality TV", "reality"),
    (Domain::TvShows, "Animation", "animation"),
    (Domain::TvShows, "Anime", "anime"),
    (Domain::TvShows, "Documentary", "documentary"),
    (Domain::TvShows, "Science Fiction", "science_fiction"),
    (Domain::TvShows, "Sci-Fi", "science_fiction"),
    (Domain::TvShows, "Fantasy", "fantasy"),
    // Brands
    (Domain::Brands, "Fashion", "fashion"),
    (Domain::Brands, "Technology", "technology"),
    (Domain::Brands, "Tech", "technology"),
    (Domain::Brands, "Sports", "sportswear"),
    (Domain::Brands, "Sportswear", "sportswear"),
    (Domain::Brands, "Beauty", "beauty"),
    (Domain::Brands, "Food", "food_beverage"),
    (Domain::Brands, "Beverages", "food_beverage"),
    (Domain::Brands, "Outdoor", "outdoor"),
    (Domain::Brands, "Gaming", "gaming"),
];

/// Per-domain fallback labels. The first entry is the emergency choice.
const FALLBACK_TABLE: &[(Domain, &[&str])] = &[
    (
        Domain::Books,
        &["Fiction", "Mystery", "Science Fiction", "Fantasy", "Romance"],
    ),
    (Domain::Movies, &["Drama", "Comedy", "Action", "Thriller"]),
    (
        Domain::Podcasts,
        &["Comedy", "True Crime", "News", "Technology"],
    ),
    (Domain::TvShows, &["Drama", "Comedy", "Crime", "Reality"]),
    (Domain::Brands, &["Fashion", "Technology", "Sportswear"]),
];

/// Immutable lookup from human genre labels to the catalog's canonical tags.
///
/// Built once at startup and shared by reference; there is no runtime mutation.
#[derive(Debug, Clone)]
pub struct GenreTagMapper {
    tags: HashMap<(Domain, String), String>,
    fallbacks: HashMap<Domain, Vec<String>>,
}

impl Default for GenreTagMapper {
    fn default() -> Self {
        Self::builtin()
    }
}

impl GenreTagMapper {
    /// Mapper backed by the built-in genre tables
    pub fn builtin() -> Self {
        let entries = GENRE_TABLE.iter().map(|(domain, label, suffix)| {
            let prefix = match domain {
                Domain::Brands => BRAND_CATEGORY,
                _ => MEDIA_GENRE,
            };
            (*domain, label.to_string(), format!("{}:{}", prefix, suffix))
        });
        let fallbacks = FALLBACK_TABLE.iter().map(|(domain, labels)| {
            (*domain, labels.iter().map(|l| l.to_string()).collect())
        });

        Self::new(entries, fallbacks)
    }

    /// Builds a mapper from explicit tables
    pub fn new<E, F>(entries: E, fallbacks: F) -> Self
    where
        E: IntoIterator<Item = (Domain, String, String)>,
        F: IntoIterator<Item = (Domain, Vec<String>)>,
    {
        let tags = entries
            .into_iter()
            .map(|(domain, label, tag)| ((domain, normalize_label(&label)), tag))
            .collect();

        Self {
            tags,
            fallbacks: fallbacks.into_iter().collect(),
        }
    }

    /// Canonical tag for a label, or `None` when the label is unmapped
    pub fn tag_for(&self, domain: Domain, label: &str) -> Option<&str> {
        self.tags
            .get(&(domain, normalize_label(label)))
            .map(String::as_str)
    }

    /// Ordered fallback labels for a domain
    pub fn fallback_labels(&self, domain: Domain) -> &[String] {
        self.fallbacks
            .get(&domain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Single label used by the emergency tier
    pub fn emergency_label(&self, domain: Domain) -> Option<&str> {
        self.fallback_labels(domain).first().map(String::as_str)
    }

    /// Readable form of a label's canonical tag, e.g. "science fiction" for
    /// `urn:tag:genre:media:science_fiction`
    pub fn readable_tag(&self, domain: Domain, label: &str) -> Option<String> {
        self.tag_for(domain, label).map(readable_tag)
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Last tag segment with underscores turned into spaces
pub fn readable_tag(tag: &str) -> String {
    tag.rsplit(':')
        .next()
        .unwrap_or(tag)
        .replace('_', " ")
        .to_lowercase()
}
