use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::CatalogStore,
    error::AppResult,
    models::CatalogPage,
    services::providers::CatalogProvider,
};

/// Resumable pagination cursor persisted to a file
///
/// Holds the last page that was fetched and stored successfully.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Page to start from: the stored page, or 1 when nothing usable is stored
    pub async fn read(&self) -> u32 {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => match contents.trim().parse::<u32>() {
                Ok(page) if page > 0 => page,
                _ => {
                    tracing::warn!(
                        path = %self.path.display(),
                        "Unreadable checkpoint, starting from page 1"
                    );
                    1
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 1,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Could not read checkpoint, starting from page 1"
                );
                1
            }
        }
    }

    pub async fn write(&self, page: u32) -> AppResult<()> {
        tokio::fs::write(&self.path, page.to_string()).await?;
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Outcome of a completed ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub first_page: u32,
    pub last_page: u32,
    pub pages_stored: u32,
    pub media_stored: usize,
    pub failed_attempts: u32,
}

/// Copies the provider's catalog into the catalog store page by page
pub struct CatalogIngestor {
    provider: Arc<dyn CatalogProvider>,
    store: CatalogStore,
    checkpoint: Checkpoint,
    per_page: u32,
    page_delay: Duration,
    retry_backoff: Duration,
}

impl CatalogIngestor {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        store: CatalogStore,
        checkpoint: Checkpoint,
        per_page: u32,
    ) -> Self {
        Self {
            provider,
            store,
            checkpoint,
            per_page,
            page_delay: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(60),
        }
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    /// Runs until the provider reports no further pages
    ///
    /// Starts at the checkpointed page. A failed page is retried after the
    /// backoff, indefinitely, and the checkpoint is left untouched meanwhile.
    /// The checkpoint is removed once the last page is stored.
    pub async fn run(&self) -> AppResult<IngestSummary> {
        self.store.ensure_schema().await?;

        let first_page = self.checkpoint.read().await;
        let mut current_page = first_page;
        let mut pages_stored = 0;
        let mut media_stored = 0;
        let mut failed_attempts = 0;

        tracing::info!(
            provider = self.provider.name(),
            start_page = first_page,
            per_page = self.per_page,
            "Starting catalog ingestion"
        );

        loop {
            tracing::info!(page = current_page, "Fetching page");

            match self.ingest_page(current_page).await {
                Ok(page) => {
                    pages_stored += 1;
                    media_stored += page.media.len();

                    tracing::info!(
                        page = current_page,
                        last_page = ?page.page_info.last_page,
                        media_count = page.media.len(),
                        "Stored page"
                    );

                    if page.has_next_page() {
                        current_page += 1;
                        tokio::time::sleep(self.page_delay).await;
                    } else {
                        self.checkpoint.clear().await?;
                        break;
                    }
                }
                Err(e) => {
                    failed_attempts += 1;
                    tracing::error!(
                        page = current_page,
                        error = %e,
                        retry_in_secs = self.retry_backoff.as_secs(),
                        "Error encountered, retrying page"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
            }
        }

        tracing::info!(
            pages_stored,
            media_stored,
            failed_attempts,
            "Catalog ingestion completed"
        );

        Ok(IngestSummary {
            first_page,
            last_page: current_page,
            pages_stored,
            media_stored,
            failed_attempts,
        })
    }

    /// Fetch, store and checkpoint one page
    async fn ingest_page(&self, page: u32) -> AppResult<CatalogPage> {
        let catalog_page = self.provider.fetch_page(page, self.per_page).await?;
        self.store.upsert_page(&catalog_page.media).await?;
        self.checkpoint.write(page).await?;
        Ok(catalog_page)
    }
}
