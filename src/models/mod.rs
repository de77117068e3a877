pub mod anilist;
pub mod history;
pub mod media;
pub mod recommendation;

pub use anilist::{ApiError, ApiMedia, ApiPageResponse, CatalogPage, PageInfo};
pub use history::{HistoryEntry, ListStatus, RatedMedia};
pub use media::{decode_list, MediaItem, MediaTitles, Tag, DEFAULT_TAG_RANK};
pub use recommendation::{
    Candidate, CandidateSummary, RecommendationQuery, RecommendationResponse,
};
