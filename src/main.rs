use std::{sync::Arc, time::Duration};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use campus_recs::{
    api::{create_router, AppState},
    config::{Config, StoreBackend},
    db::{create_pool, HistoryStore, MemoryStore, PeerSource, PgStore, ProfileStore},
    services::{
        CascadeSettings, FallbackCascade, GenreTagMapper, HistorySink, QlooProvider, Randomness,
        RecommendationEngine,
    },
};

/// Profile, peer and history capabilities backed by one store
struct Stores {
    profiles: Arc<dyn ProfileStore>,
    peers: Arc<dyn PeerSource>,
    history: Arc<dyn HistoryStore>,
}

impl Stores {
    fn from_store<S>(store: S) -> Self
    where
        S: ProfileStore + PeerSource + HistoryStore + Clone + 'static,
    {
        Self {
            profiles: Arc::new(store.clone()),
            peers: Arc::new(store.clone()),
            history: Arc::new(store),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_recs=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let stores = match config.store {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            Stores::from_store(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; profiles and history are not persisted");
            Stores::from_store(MemoryStore::new())
        }
    };

    let catalog = QlooProvider::new(
        config.catalog_api_key.clone(),
        config.catalog_api_url.clone(),
        Duration::from_secs(config.catalog_timeout_secs),
        config.catalog_max_concurrency,
    )?;

    let cascade = FallbackCascade::new(
        Arc::new(catalog),
        Arc::new(GenreTagMapper::builtin()),
        CascadeSettings {
            results_per_genre: config.results_per_genre,
            ..CascadeSettings::default()
        },
    );

    let (history_sink, history_writer) = HistorySink::spawn(stores.history.clone());

    let engine = RecommendationEngine::new(cascade, stores.profiles, stores.peers, history_sink)
        .with_peer_sample_size(config.peer_sample_size)
        .with_randomness(Randomness::from_seed(config.recommendation_seed));

    let app = create_router(AppState::new(engine, stores.history));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and its sink senders) is gone; flush what is still queued
    history_writer.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
