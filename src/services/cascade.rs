use std::{collections::HashSet, fmt::Display, sync::Arc};

use futures::stream::{self, StreamExt};
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::{
    models::{CatalogEntity, Domain, Recommendation, RecommendationType, UserPreferenceProfile},
    services::{
        genres::GenreTagMapper,
        normalizer::normalize,
        providers::{CatalogProvider, CatalogQuery, Demographics},
        scoring::{clamp_score, RelevanceScorer},
    },
};

/// Genres queried per tier
pub const MAX_GENRES_PER_TIER: usize = 3;
/// Primary calls use an offset in `0..PRIMARY_OFFSET_RANGE`
pub const PRIMARY_OFFSET_RANGE: u32 = 10;
/// Emergency calls use an offset in `0..EMERGENCY_OFFSET_RANGE`
pub const EMERGENCY_OFFSET_RANGE: u32 = 5;
pub const EMERGENCY_RESULTS: u32 = 3;
pub const FRIEND_SCORE_FACTOR: f64 = 0.8;
pub const USER_EMERGENCY_SCORE: f64 = 0.5;
pub const FRIEND_EMERGENCY_SCORE: f64 = 0.4;

/// Stage of the per-domain fallback cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Labels from the signal itself (own interests, or peers')
    Primary,
    /// Domain fallback labels
    Fallback,
    /// Single first fallback label with default demographics
    Emergency,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Primary => "primary",
            Tier::Fallback => "fallback",
            Tier::Emergency => "emergency",
        };
        write!(f, "{}", name)
    }
}

/// Which pipeline is running the cascade; controls scoring and wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    UserBased,
    FriendBased,
}

impl CascadeMode {
    /// Multiplier applied to every computed score
    pub fn score_factor(self) -> f64 {
        match self {
            CascadeMode::UserBased => 1.0,
            CascadeMode::FriendBased => FRIEND_SCORE_FACTOR,
        }
    }

    /// Flat score given to every emergency-tier result
    pub fn emergency_score(self) -> f64 {
        match self {
            CascadeMode::UserBased => USER_EMERGENCY_SCORE,
            CascadeMode::FriendBased => FRIEND_EMERGENCY_SCORE,
        }
    }

    pub fn recommendation_type(self) -> RecommendationType {
        match self {
            CascadeMode::UserBased => RecommendationType::UserBased,
            CascadeMode::FriendBased => RecommendationType::FriendBased,
        }
    }

    /// Explanation for a result. `own_interest` only affects the user-based
    /// fallback tier, where a fallback label may also be one of the user's.
    pub fn explain(self, tier: Tier, genre: &str, domain: Domain, own_interest: bool) -> String {
        let domain = domain.display_name();
        match (self, tier) {
            (CascadeMode::UserBased, Tier::Primary) => {
                format!("Recommended because you like {} {}", genre, domain)
            }
            (CascadeMode::UserBased, Tier::Fallback) if own_interest => {
                format!("Recommended because you like {} {}", genre, domain)
            }
            (CascadeMode::UserBased, Tier::Fallback) => {
                format!("Popular {} {} you might enjoy", genre, domain)
            }
            (CascadeMode::UserBased, Tier::Emergency) => format!("Discover popular {}", domain),
            (CascadeMode::FriendBased, Tier::Primary) => {
                format!("Because your friends like {} {}", genre, domain)
            }
            (CascadeMode::FriendBased, Tier::Fallback) => {
                format!("Others enjoy {} {}", genre, domain)
            }
            (CascadeMode::FriendBased, Tier::Emergency) => {
                format!("Trending {} to explore", domain)
            }
        }
    }
}

/// Labels that seed the first tier of a domain, and the tier they count as
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub labels: Vec<String>,
    pub tier: Tier,
}

impl Signal {
    /// The profile's own interest labels for a domain
    pub fn own(profile: &UserPreferenceProfile, domain: Domain) -> Self {
        Self {
            labels: profile.interests(domain).to_vec(),
            tier: Tier::Primary,
        }
    }

    /// Labels gathered from other people
    pub fn peers(labels: Vec<String>) -> Self {
        Self {
            labels,
            tier: Tier::Primary,
        }
    }

    /// Fallback labels standing in for missing signal
    pub fn substituted(labels: Vec<String>) -> Self {
        Self {
            labels,
            tier: Tier::Fallback,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CascadeSettings {
    pub results_per_genre: u32,
    pub emergency_results: u32,
    pub max_genres: usize,
    /// In-flight genre queries per domain
    pub query_concurrency: usize,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            results_per_genre: 5,
            emergency_results: EMERGENCY_RESULTS,
            max_genres: MAX_GENRES_PER_TIER,
            query_concurrency: MAX_GENRES_PER_TIER,
        }
    }
}

/// Per-domain three-tier retrieval: signal genres, then fallback genres, then
/// one emergency genre. The first tier that yields anything wins.
pub struct FallbackCascade {
    catalog: Arc<dyn CatalogProvider>,
    mapper: Arc<GenreTagMapper>,
    scorer: RelevanceScorer,
    settings: CascadeSettings,
}

impl FallbackCascade {
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        mapper: Arc<GenreTagMapper>,
        settings: CascadeSettings,
    ) -> Self {
        let scorer = RelevanceScorer::new(mapper.clone());
        Self {
            catalog,
            mapper,
            scorer,
            settings,
        }
    }

    pub fn mapper(&self) -> &GenreTagMapper {
        &self.mapper
    }

    /// Runs the cascade for one domain.
    ///
    /// Never fails: an empty result means even the emergency tier came back
    /// empty.
    pub async fn run(
        &self,
        mode: CascadeMode,
        profile: &UserPreferenceProfile,
        domain: Domain,
        signal: Signal,
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let mut tier = signal.tier;
        let mut selected = self.select(domain, &signal.labels, &[], rng);

        if selected.is_empty() {
            tier = Tier::Fallback;
            selected = self.select(domain, self.mapper.fallback_labels(domain), &[], rng);
        }

        let mut results = self
            .query_tier(mode, profile, domain, tier, &selected, rng)
            .await;

        if results.is_empty() && tier == Tier::Primary {
            let retry = self.select(domain, self.mapper.fallback_labels(domain), &selected, rng);
            tier = Tier::Fallback;
            results = self
                .query_tier(mode, profile, domain, tier, &retry, rng)
                .await;
        }

        if results.is_empty() {
            tier = Tier::Emergency;
            results = self.emergency(mode, domain, rng).await;
        }

        tracing::info!(
            domain = %domain,
            mode = ?mode,
            tier = %tier,
            results = results.len(),
            "Domain cascade finished"
        );

        results
    }

    /// Mapped labels whose tag is not already covered by `exclude`, one per
    /// tag, shuffled and capped
    fn select(
        &self,
        domain: Domain,
        labels: &[String],
        exclude: &[String],
        rng: &mut StdRng,
    ) -> Vec<String> {
        // Keyed by canonical tag so "Sci-Fi" and "Science Fiction" count once
        let mut seen: HashSet<&str> = exclude
            .iter()
            .filter_map(|l| self.mapper.tag_for(domain, l))
            .collect();
        let mut candidates: Vec<String> = labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| {
                self.mapper
                    .tag_for(domain, l)
                    .is_some_and(|tag| seen.insert(tag))
            })
            .map(str::to_string)
            .collect();

        candidates.shuffle(rng);
        candidates.truncate(self.settings.max_genres);
        candidates
    }

    async fn query_tier(
        &self,
        mode: CascadeMode,
        profile: &UserPreferenceProfile,
        domain: Domain,
        tier: Tier,
        labels: &[String],
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let demographics = Demographics::from_profile(profile);
        let queries: Vec<(String, CatalogQuery)> = labels
            .iter()
            .filter_map(|label| {
                let tag = self.mapper.tag_for(domain, label)?;
                Some((
                    label.clone(),
                    CatalogQuery {
                        domain,
                        tag: tag.to_string(),
                        demographics: demographics.clone(),
                        take: self.settings.results_per_genre,
                        offset: rng.gen_range(0..PRIMARY_OFFSET_RANGE),
                    },
                ))
            })
            .collect();

        let batches: Vec<(String, Vec<CatalogEntity>)> = stream::iter(queries)
            .map(|(label, query)| async move {
                let entities = self.catalog.query(&query).await;
                (label, entities)
            })
            .buffered(self.settings.query_concurrency.max(1))
            .collect()
            .await;

        let mut results = Vec::new();
        for (label, entities) in batches {
            let own_interest = profile.has_interest(domain, &label);
            for entity in entities {
                let mut rec = normalize(entity, domain);
                rec.relevance_score =
                    clamp_score(self.scorer.score(profile, &rec) * mode.score_factor());
                rec.explanation = mode.explain(tier, &label, domain, own_interest);
                rec.recommendation_type = mode.recommendation_type();
                results.push(rec);
            }
        }
        results
    }

    async fn emergency(
        &self,
        mode: CascadeMode,
        domain: Domain,
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let Some(label) = self.mapper.emergency_label(domain) else {
            return Vec::new();
        };
        let Some(tag) = self.mapper.tag_for(domain, label) else {
            return Vec::new();
        };

        let query = CatalogQuery {
            domain,
            tag: tag.to_string(),
            demographics: Demographics::emergency_default(),
            take: self.settings.emergency_results,
            offset: rng.gen_range(0..EMERGENCY_OFFSET_RANGE),
        };

        self.catalog
            .query(&query)
            .await
            .into_iter()
            .map(|entity| {
                let mut rec = normalize(entity, domain);
                rec.relevance_score = mode.emergency_score();
                rec.explanation = mode.explain(Tier::Emergency, label, domain, false);
                rec.recommendation_type = mode.recommendation_type();
                rec
            })
            .collect()
    }
}
