//! AniList GraphQL provider
//!
//! Pages through all `ANIME` media with the fields the catalog stores.

use reqwest::Client as HttpClient;
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{ApiPageResponse, CatalogPage},
    services::providers::CatalogProvider,
};

const GLOBAL_QUERY: &str = r#"
query ($page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    pageInfo {
      total
      currentPage
      lastPage
      hasNextPage
      perPage
    }
    media(type: ANIME) {
      id
      title {
        romaji
        english
        native
      }
      format
      episodes
      genres
      tags {
        name
        rank
      }
      averageScore
      popularity
      description(asHtml: false)
      rankings {
        rank
        type
        context
      }
    }
  }
}
"#;

#[derive(Clone)]
pub struct AniListProvider {
    http_client: HttpClient,
    api_url: String,
}

impl AniListProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for AniListProvider {
    async fn fetch_page(&self, page: u32, per_page: u32) -> AppResult<CatalogPage> {
        let response = self
            .http_client
            .post(&self.api_url)
            .json(&json!({
                "query": GLOBAL_QUERY,
                "variables": {
                    "page": page,
                    "perPage": per_page,
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                page,
                status = %status,
                body = %body,
                "AniList request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "AniList API returned status {}: {}",
                status, body
            )));
        }

        let body: ApiPageResponse = response.json().await?;
        let catalog_page = CatalogPage::try_from(body).inspect_err(|e| {
            tracing::error!(page, error = %e, "AniList returned no usable page");
        })?;

        tracing::debug!(
            page,
            media_count = catalog_page.media.len(),
            has_next_page = catalog_page.has_next_page(),
            "Fetched catalog page"
        );

        Ok(catalog_page)
    }

    fn name(&self) -> &'static str {
        "anilist"
    }
}
