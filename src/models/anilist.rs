use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::{MediaItem, MediaTitles, Tag};

// ============================================================================
// AniList GraphQL API Types
// ============================================================================

/// Envelope of a GraphQL page response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPageResponse {
    #[serde(default)]
    pub data: Option<ApiPageData>,
    #[serde(default)]
    pub errors: Option<Vec<ApiError>>,
}

/// Entry of a GraphQL `errors` array
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPageData {
    #[serde(rename = "Page", default)]
    pub page: Option<ApiPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPage {
    #[serde(rename = "pageInfo", default)]
    pub page_info: Option<PageInfo>,
    #[serde(default)]
    pub media: Option<Vec<ApiMedia>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub last_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: Option<bool>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// One media record as returned by the page query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMedia {
    pub id: i64,
    #[serde(default)]
    pub title: Option<ApiTitle>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub episodes: Option<i64>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<ApiTag>>,
    #[serde(default)]
    pub average_score: Option<i64>,
    #[serde(default)]
    pub popularity: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rankings: Option<Vec<ApiRanking>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTag {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRanking {
    pub rank: Option<i64>,
    #[serde(rename = "type")]
    pub ranking_type: Option<String>,
    pub context: Option<String>,
}

/// A decoded catalog page
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub media: Vec<ApiMedia>,
    pub page_info: PageInfo,
}

/// A reply carrying GraphQL errors, or no `Page`, is a failed fetch
impl TryFrom<ApiPageResponse> for CatalogPage {
    type Error = AppError;

    fn try_from(response: ApiPageResponse) -> Result<Self, Self::Error> {
        if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
            let details: Vec<String> = errors
                .iter()
                .map(|e| match (e.status, e.message.as_deref()) {
                    (Some(status), Some(message)) => format!("{} ({})", message, status),
                    (Some(status), None) => format!("status {}", status),
                    (None, Some(message)) => message.to_string(),
                    (None, None) => "unknown error".to_string(),
                })
                .collect();
            return Err(AppError::ExternalApi(format!(
                "AniList returned errors: {}",
                details.join("; ")
            )));
        }

        let page = response
            .data
            .and_then(|d| d.page)
            .ok_or_else(|| AppError::ExternalApi("AniList response has no Page".to_string()))?;

        Ok(Self {
            media: page.media.unwrap_or_default(),
            page_info: page.page_info.unwrap_or_default(),
        })
    }
}

impl CatalogPage {
    pub fn has_next_page(&self) -> bool {
        self.page_info.has_next_page.unwrap_or(false)
    }
}

impl ApiMedia {
    pub fn tags(&self) -> Vec<Tag> {
        self.tags
            .iter()
            .flatten()
            .map(|tag| Tag::Ranked {
                name: tag.name.clone(),
                rank: tag.rank,
            })
            .collect()
    }
}

impl From<&ApiMedia> for MediaItem {
    fn from(media: &ApiMedia) -> Self {
        let title = media.title.clone().unwrap_or_default();
        Self {
            id: media.id,
            titles: MediaTitles {
                romaji: title.romaji,
                english: title.english,
                native: title.native,
            },
            format: media.format.clone(),
            episodes: media.episodes,
            genres: media.genres.clone().unwrap_or_default(),
            tags: media.tags(),
            average_score: media.average_score,
            popularity: media.popularity,
        }
    }
}
