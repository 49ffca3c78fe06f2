pub mod cascade;
pub mod friends;
pub mod genres;
pub mod history;
pub mod merger;
pub mod normalizer;
pub mod providers;
pub mod randomness;
pub mod recommendations;
pub mod scoring;

pub use cascade::{CascadeSettings, FallbackCascade};
pub use genres::GenreTagMapper;
pub use history::{HistorySink, HistoryWriterHandle};
pub use providers::{CatalogProvider, QlooProvider};
pub use randomness::Randomness;
pub use recommendations::{RecommendationEngine, RecommendationRequest};
