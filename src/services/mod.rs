pub mod engagement;
pub mod ingestion;
pub mod profile;
pub mod providers;
pub mod recommendations;
pub mod reranker;
pub mod scoring;

pub use engagement::EngagementSets;
pub use ingestion::{CatalogIngestor, Checkpoint, IngestSummary};
pub use profile::PreferenceProfile;
pub use recommendations::{rank_candidates, GenreMatch, RecommendationService};
pub use reranker::{apply_reranking, GeminiClient, LlmReranker, Reranker, TextCompletion};
pub use scoring::compute_similarity;
