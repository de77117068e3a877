use serde::{Deserialize, Serialize};

use super::MediaItem;

/// A catalog item paired with its computed similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub media: MediaItem,
    pub score: f64,
}

/// The view of a candidate handed to the external re-ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: i64,
    pub title: String,
    pub format: Option<String>,
    pub average_score: Option<i64>,
    pub popularity: Option<i64>,
}

impl From<&Candidate> for CandidateSummary {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.media.id,
            title: candidate.media.display_title().to_string(),
            format: candidate.media.format.clone(),
            average_score: candidate.media.average_score,
            popularity: candidate.media.popularity,
        }
    }
}

/// Parameters of one recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationQuery {
    pub top_n: usize,
    pub desired_genre: Option<String>,
    pub rerank: bool,
}

impl RecommendationQuery {
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            desired_genre: None,
            rerank: false,
        }
    }

    /// Sets the genre filter; blank input clears it
    pub fn with_genre(mut self, genre: Option<String>) -> Self {
        self.desired_genre = genre
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());
        self
    }

    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = rerank;
        self
    }
}

impl Default for RecommendationQuery {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Recommendation as returned by the HTTP API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub id: i64,
    pub title: String,
    pub format: Option<String>,
    pub genres: Vec<String>,
    pub average_score: Option<i64>,
    pub popularity: Option<i64>,
    pub score: f64,
}

impl From<&Candidate> for RecommendationResponse {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.media.id,
            title: candidate.media.display_title().to_string(),
            format: candidate.media.format.clone(),
            genres: candidate.media.genres.clone(),
            average_score: candidate.media.average_score,
            popularity: candidate.media.popularity,
            score: candidate.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_genre_is_cleared() {
        let query = RecommendationQuery::new(5).with_genre(Some("   ".to_string()));
        assert_eq!(query.desired_genre, None);

        let query = RecommendationQuery::new(5).with_genre(Some(" Comedy ".to_string()));
        assert_eq!(query.desired_genre.as_deref(), Some("Comedy"));
    }

    #[test]
    fn test_summary_uses_display_title() {
        let mut media = MediaItem::new(7);
        media.titles.romaji = Some("Mushishi".to_string());
        media.format = Some("TV".to_string());
        let candidate = Candidate { media, score: 3.0 };

        let summary = CandidateSummary::from(&candidate);
        assert_eq!(summary.id, 7);
        assert_eq!(summary.title, "Mushishi");
        assert_eq!(summary.format.as_deref(), Some("TV"));
    }
}
