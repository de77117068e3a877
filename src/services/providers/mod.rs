//! Catalog data provider abstraction
//!
//! Providers fetch one page of global media at a time for the ingestion job.

use crate::{error::AppResult, models::CatalogPage};

pub mod anilist;

pub use anilist::AniListProvider;

/// Trait for paginated catalog sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch one page of media; pages are numbered from 1
    async fn fetch_page(&self, page: u32, per_page: u32) -> AppResult<CatalogPage>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
