use std::sync::Arc;

use futures::future::join_all;
use rand::rngs::StdRng;
use uuid::Uuid;

use crate::{
    db::{PeerSource, ProfileStore},
    error::{AppError, AppResult},
    models::{Domain, Recommendation, RequestType, UserPreferenceProfile},
    services::{
        cascade::{CascadeMode, FallbackCascade, Signal},
        friends::peer_signal,
        history::HistorySink,
        merger::{diversify, merge_ranked, take_covering, FRIEND_BASED_CAP, USER_BASED_CAP},
        randomness::{fork, Randomness},
    },
};

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_PEER_SAMPLE_SIZE: usize = 5;

/// A validated recommendation request for one subject
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub kind: RequestType,
    pub domains: Vec<Domain>,
    pub limit: usize,
}

impl Default for RecommendationRequest {
    fn default() -> Self {
        Self {
            kind: RequestType::UserBased,
            domains: Domain::default_set(),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Orchestrates the user-based and friend-based pipelines over the cascade,
/// then records what was served.
pub struct RecommendationEngine {
    cascade: FallbackCascade,
    profiles: Arc<dyn ProfileStore>,
    peers: Arc<dyn PeerSource>,
    history: HistorySink,
    peer_sample_size: usize,
    randomness: Randomness,
}

impl RecommendationEngine {
    pub fn new(
        cascade: FallbackCascade,
        profiles: Arc<dyn ProfileStore>,
        peers: Arc<dyn PeerSource>,
        history: HistorySink,
    ) -> Self {
        Self {
            cascade,
            profiles,
            peers,
            history,
            peer_sample_size: DEFAULT_PEER_SAMPLE_SIZE,
            randomness: Randomness::default(),
        }
    }

    pub fn with_peer_sample_size(mut self, size: usize) -> Self {
        self.peer_sample_size = size;
        self
    }

    pub fn with_randomness(mut self, randomness: Randomness) -> Self {
        self.randomness = randomness;
        self
    }

    /// Produces recommendations for `user_id` and queues them for history.
    ///
    /// Fails only when the subject has no stored profile or the profile
    /// lookup itself fails; catalog trouble degrades to fewer results.
    pub async fn recommend(
        &self,
        user_id: Uuid,
        request: &RecommendationRequest,
    ) -> AppResult<Vec<Recommendation>> {
        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut rng = self.randomness.rng();
        let domains = &request.domains;

        let mut recommendations = match request.kind {
            RequestType::UserBased => self.user_based(&profile, domains, &mut rng).await,
            RequestType::FriendBased => self.friend_based(&profile, domains, &mut rng).await,
            RequestType::All => {
                let mut children = fork(&mut rng, 2).into_iter();
                let (Some(mut user_rng), Some(mut friend_rng)) = (children.next(), children.next())
                else {
                    return Err(AppError::Internal("RNG fork came up short".to_string()));
                };
                let (user, friend) = futures::join!(
                    self.user_based(&profile, domains, &mut user_rng),
                    self.friend_based(&profile, domains, &mut friend_rng),
                );
                diversify(vec![user, friend], request.limit, &mut rng)
            }
        };
        recommendations = take_covering(recommendations, request.limit);

        tracing::info!(
            %user_id,
            kind = request.kind.as_str(),
            domains = domains.len(),
            served = recommendations.len(),
            "Recommendations served"
        );

        self.history.record(user_id, &recommendations);
        Ok(recommendations)
    }

    async fn user_based(
        &self,
        profile: &UserPreferenceProfile,
        domains: &[Domain],
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let tasks = domains
            .iter()
            .map(|&domain| (domain, Signal::own(profile, domain)))
            .collect();
        let merged = self
            .fan_out(CascadeMode::UserBased, profile, tasks, rng)
            .await;
        merge_ranked(merged, USER_BASED_CAP, rng)
    }

    /// Falls back to the user-based path when no peers can be sampled
    async fn friend_based(
        &self,
        profile: &UserPreferenceProfile,
        domains: &[Domain],
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let peers = match self
            .peers
            .sample_peers(profile.user_id, self.peer_sample_size)
            .await
        {
            Ok(peers) => peers,
            Err(e) => {
                tracing::warn!(error = %e, "Peer sampling failed, using user-based path");
                Vec::new()
            }
        };

        if peers.is_empty() {
            tracing::debug!(user_id = %profile.user_id, "No peers available");
            return self.user_based(profile, domains, rng).await;
        }

        let mapper = self.cascade.mapper();
        let tasks = domains
            .iter()
            .map(|&domain| (domain, peer_signal(profile, &peers, domain, mapper)))
            .collect();
        let merged = self
            .fan_out(CascadeMode::FriendBased, profile, tasks, rng)
            .await;
        merge_ranked(merged, FRIEND_BASED_CAP, rng)
    }

    /// Runs one cascade per domain concurrently, each with its own RNG
    async fn fan_out(
        &self,
        mode: CascadeMode,
        profile: &UserPreferenceProfile,
        tasks: Vec<(Domain, Signal)>,
        rng: &mut StdRng,
    ) -> Vec<Recommendation> {
        let children = fork(rng, tasks.len());
        let runs = tasks
            .into_iter()
            .zip(children)
            .map(|((domain, signal), mut child)| async move {
                self.cascade
                    .run(mode, profile, domain, signal, &mut child)
                    .await
            });

        join_all(runs).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{HistoryStore, MemoryStore},
        models::{CatalogEntity, RecommendationType},
        services::{
            cascade::CascadeSettings,
            genres::GenreTagMapper,
            history::HistoryWriterHandle,
            providers::{CatalogQuery, MockCatalogProvider},
            scoring::{MAX_SCORE, MIN_SCORE},
        },
    };
    use std::collections::HashSet;

    struct UnreachablePeers;

    #[async_trait::async_trait]
    impl PeerSource for UnreachablePeers {
        async fn sample_peers(
            &self,
            _subject: Uuid,
            _limit: usize,
        ) -> AppResult<Vec<UserPreferenceProfile>> {
            Err(AppError::Internal("connection reset".to_string()))
        }
    }

    fn entities_for(query: &CatalogQuery) -> Vec<CatalogEntity> {
        (0..query.take)
            .map(|i| {
                let label = query.tag.rsplit(':').next().unwrap_or_default();
                serde_json::from_value(serde_json::json!({
                    "entity_id": format!("{}:{}#{}", query.domain, query.tag, i),
                    "name": format!("{} {} {}", query.domain, label, i),
                    "popularity": 0.1 * f64::from(i),
                    "tags": [{ "name": label.replace('_', " ") }],
                }))
                .unwrap()
            })
            .collect()
    }

    fn catalog() -> MockCatalogProvider {
        let mut mock = MockCatalogProvider::new();
        mock.expect_query().returning(entities_for);
        mock
    }

    fn engine_with(
        store: &MemoryStore,
        peers: Arc<dyn PeerSource>,
    ) -> (RecommendationEngine, HistoryWriterHandle) {
        let cascade = FallbackCascade::new(
            Arc::new(catalog()),
            Arc::new(GenreTagMapper::builtin()),
            CascadeSettings::default(),
        );
        let (sink, handle) = HistorySink::spawn(Arc::new(store.clone()));
        let engine = RecommendationEngine::new(cascade, Arc::new(store.clone()), peers, sink)
            .with_randomness(Randomness::Seeded(42));
        (engine, handle)
    }

    fn engine(store: &MemoryStore) -> (RecommendationEngine, HistoryWriterHandle) {
        engine_with(store, Arc::new(store.clone()))
    }

    async fn subject(store: &MemoryStore) -> Uuid {
        let profile = UserPreferenceProfile::new(Uuid::new_v4())
            .with_interests(Domain::Books, ["Fantasy", "sci-fi"])
            .with_interests(Domain::Movies, ["Drama"])
            .with_interests(Domain::Podcasts, ["True Crime"]);
        let id = profile.user_id;
        store.upsert_profile(profile).await;
        id
    }

    fn request(kind: RequestType, limit: usize) -> RecommendationRequest {
        RecommendationRequest {
            kind,
            limit,
            ..Default::default()
        }
    }

    fn assert_well_formed(recs: &[Recommendation]) {
        let mut ids = HashSet::new();
        let mut titles = HashSet::new();
        for rec in recs {
            assert!(rec.relevance_score >= MIN_SCORE && rec.relevance_score <= MAX_SCORE);
            assert!(ids.insert(rec.entity_id.clone()), "duplicate {}", rec.entity_id);
            assert!(
                titles.insert(rec.title.trim().to_lowercase()),
                "duplicate title {}",
                rec.title
            );
            assert!(!rec.explanation.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let (engine, _handle) = engine(&store);

        let err = engine
            .recommend(Uuid::new_v4(), &RecommendationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_user_based_respects_limit_and_records_history() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, handle) = engine(&store);

        let recs = engine
            .recommend(user, &request(RequestType::UserBased, 7))
            .await
            .unwrap();
        handle.shutdown().await;

        assert_eq!(recs.len(), 7);
        assert_well_formed(&recs);
        assert!(recs
            .iter()
            .all(|r| r.recommendation_type == RecommendationType::UserBased));

        let history = store.recent_for_user(user, 100).await.unwrap();
        assert_eq!(history.len(), recs.len());
    }

    #[tokio::test]
    async fn test_user_based_caps_intermediate_list() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, _handle) = engine(&store);

        let recs = engine
            .recommend(user, &request(RequestType::UserBased, 50))
            .await
            .unwrap();
        assert_eq!(recs.len(), USER_BASED_CAP);
    }

    #[tokio::test]
    async fn test_outscored_domains_still_served() {
        let store = MemoryStore::new();
        let profile = UserPreferenceProfile::new(Uuid::new_v4())
            .with_interests(Domain::Books, ["Fantasy", "Mystery", "Romance"]);
        let user = profile.user_id;
        store.upsert_profile(profile).await;
        let expected: HashSet<Domain> = Domain::default_set().into_iter().collect();

        for seed in 0..20 {
            let (engine, _handle) = engine(&store);
            let engine = engine.with_randomness(Randomness::Seeded(seed));

            for kind in [RequestType::UserBased, RequestType::All] {
                let recs = engine.recommend(user, &request(kind, 10)).await.unwrap();
                assert_eq!(recs.len(), 10);
                assert_well_formed(&recs);

                let served: HashSet<Domain> = recs.iter().map(|r| r.entity_type).collect();
                assert_eq!(served, expected, "seed {seed} {kind:?}");
            }
        }
    }

    #[tokio::test]
    async fn test_limit_below_domain_count_keeps_distinct_domains() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, _handle) = engine(&store);

        let recs = engine
            .recommend(user, &request(RequestType::UserBased, 2))
            .await
            .unwrap();
        assert_eq!(recs.len(), 2);
        assert_ne!(recs[0].entity_type, recs[1].entity_type);
    }

    #[tokio::test]
    async fn test_seeded_requests_repeat() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, _handle) = engine(&store);

        let first = engine
            .recommend(user, &RecommendationRequest::default())
            .await
            .unwrap();
        let second = engine
            .recommend(user, &RecommendationRequest::default())
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_friend_based_without_peers_matches_user_based() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, _handle) = engine(&store);

        let user_based = engine
            .recommend(user, &request(RequestType::UserBased, 10))
            .await
            .unwrap();
        let friend_based = engine
            .recommend(user, &request(RequestType::FriendBased, 10))
            .await
            .unwrap();

        assert_eq!(user_based, friend_based);
    }

    #[tokio::test]
    async fn test_peer_failure_falls_back_to_user_based() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        let (engine, _handle) = engine_with(&store, Arc::new(UnreachablePeers));

        let recs = engine
            .recommend(user, &request(RequestType::FriendBased, 10))
            .await
            .unwrap();
        assert!(!recs.is_empty());
        assert!(recs
            .iter()
            .all(|r| r.recommendation_type == RecommendationType::UserBased));
    }

    #[tokio::test]
    async fn test_friend_based_uses_peer_genres() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        store
            .upsert_profile(
                UserPreferenceProfile::new(Uuid::new_v4())
                    .with_interests(Domain::Books, ["Mystery", "Fantasy"]),
            )
            .await;
        let (engine, _handle) = engine(&store);

        let recs = engine
            .recommend(
                user,
                &RecommendationRequest {
                    kind: RequestType::FriendBased,
                    domains: vec![Domain::Books],
                    limit: 10,
                },
            )
            .await
            .unwrap();

        assert_eq!(recs.len(), 5);
        assert_well_formed(&recs);
        for rec in &recs {
            assert_eq!(rec.recommendation_type, RecommendationType::FriendBased);
            assert_eq!(rec.explanation, "Because your friends like Mystery books");
            assert!(rec.relevance_score <= 0.8 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_all_merges_both_pipelines() {
        let store = MemoryStore::new();
        let user = subject(&store).await;
        store
            .upsert_profile(
                UserPreferenceProfile::new(Uuid::new_v4())
                    .with_interests(Domain::Movies, ["Horror", "Comedy"]),
            )
            .await;
        let (engine, _handle) = engine(&store);

        let recs = engine
            .recommend(user, &request(RequestType::All, 20))
            .await
            .unwrap();

        assert_eq!(recs.len(), 20);
        assert_well_formed(&recs);
        let kinds: HashSet<_> = recs.iter().map(|r| r.recommendation_type).collect();
        assert!(kinds.contains(&RecommendationType::UserBased));
        assert!(kinds.contains(&RecommendationType::FriendBased));
    }
}
