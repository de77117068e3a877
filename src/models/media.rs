use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Rank assumed for bare tags and ranked tags whose rank is missing
pub const DEFAULT_TAG_RANK: i64 = 1;

/// A tag attached to a media item
///
/// Catalog rows carry either plain tag labels or AniList tag records with a
/// relevance rank (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Bare(String),
    Ranked {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        rank: Option<i64>,
    },
}

impl Tag {
    pub fn ranked(name: impl Into<String>, rank: i64) -> Self {
        Tag::Ranked {
            name: Some(name.into()),
            rank: Some(rank),
        }
    }

    /// Tag label; a record without a name resolves to the empty string
    pub fn name(&self) -> &str {
        match self {
            Tag::Bare(name) => name,
            Tag::Ranked { name, .. } => name.as_deref().unwrap_or(""),
        }
    }

    pub fn effective_rank(&self) -> i64 {
        match self {
            Tag::Bare(_) => DEFAULT_TAG_RANK,
            Tag::Ranked { rank, .. } => rank.unwrap_or(DEFAULT_TAG_RANK),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaTitles {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

impl MediaTitles {
    /// English, then romaji, then native; empty strings are skipped
    pub fn display(&self) -> Option<&str> {
        [&self.english, &self.romaji, &self.native]
            .into_iter()
            .filter_map(|title| title.as_deref())
            .find(|title| !title.is_empty())
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub titles: MediaTitles,
    pub format: Option<String>,
    pub episodes: Option<i64>,
    pub genres: Vec<String>,
    pub tags: Vec<Tag>,
    pub average_score: Option<i64>,
    pub popularity: Option<i64>,
}

impl MediaItem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            titles: MediaTitles::default(),
            format: None,
            episodes: None,
            genres: Vec::new(),
            tags: Vec::new(),
            average_score: None,
            popularity: None,
        }
    }

    pub fn display_title(&self) -> &str {
        self.titles.display().unwrap_or("Unknown title")
    }
}

/// Decodes a JSON list column, degrading to an empty list when the column is
/// absent, empty or malformed
pub fn decode_list<T: DeserializeOwned>(raw: Option<&str>) -> Vec<T> {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::debug!(error = %e, "Malformed list column, treating as empty");
            Vec::new()
        }
    }
}
