use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::{CatalogStore, HistoryStore},
    error::{AppError, AppResult},
    models::{Candidate, CandidateSummary, MediaItem, RecommendationQuery},
    services::{
        engagement::EngagementSets,
        profile::PreferenceProfile,
        reranker::{apply_reranking, Reranker},
        scoring::compute_similarity,
    },
};

const GENRE_MATCH_BOOST: f64 = 1.2;
const TAG_MATCH_BOOST: f64 = 1.1;
const PLANNED_BOOST: f64 = 1.5;

/// Query text sent to the re-ranker when no genre was requested
const DEFAULT_RERANK_QUERY: &str = "general recommendations";

/// How a requested genre matched a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreMatch {
    Genre,
    Tag,
}

impl GenreMatch {
    /// Case-insensitive match of `desired` against the item's genres, then its tag names
    pub fn find(media: &MediaItem, desired: &str) -> Option<Self> {
        let desired = desired.to_lowercase();

        if media.genres.iter().any(|g| g.to_lowercase() == desired) {
            Some(GenreMatch::Genre)
        } else if media.tags.iter().any(|t| t.name().to_lowercase() == desired) {
            Some(GenreMatch::Tag)
        } else {
            None
        }
    }

    pub fn boost(self) -> f64 {
        match self {
            GenreMatch::Genre => GENRE_MATCH_BOOST,
            GenreMatch::Tag => TAG_MATCH_BOOST,
        }
    }
}

/// Scores, filters and ranks catalog items
///
/// Watched items are dropped before anything else. With a desired genre,
/// items matching neither a genre nor a tag are dropped and matches are
/// boosted (genre wins over tag). Planned items get a further boost. The
/// result is sorted by descending score, ties keeping catalog order, and
/// truncated to `top_n`.
pub fn rank_candidates(
    catalog: Vec<MediaItem>,
    profile: &PreferenceProfile,
    engagement: &EngagementSets,
    desired_genre: Option<&str>,
    top_n: usize,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for media in catalog {
        if engagement.is_watched(media.id) {
            continue;
        }

        let genre_match = match desired_genre {
            Some(desired) => match GenreMatch::find(&media, desired) {
                Some(found) => Some(found),
                None => continue,
            },
            None => None,
        };

        let mut score = compute_similarity(&media, profile);

        if let Some(found) = genre_match {
            score *= found.boost();
        }

        if engagement.is_planned(media.id) {
            score *= PLANNED_BOOST;
        }

        candidates.push(Candidate { media, score });
    }

    // stable: equal scores keep catalog order
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_n);
    candidates
}

/// Recommendation pipeline over the history and catalog stores
pub struct RecommendationService {
    history: HistoryStore,
    catalog: CatalogStore,
    reranker: Option<Arc<dyn Reranker>>,
}

impl RecommendationService {
    pub fn new(history: HistoryStore, catalog: CatalogStore) -> Self {
        Self {
            history,
            catalog,
            reranker: None,
        }
    }

    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Computes the top recommendations for the query
    ///
    /// Store failures are returned to the caller. Re-ranking, when requested,
    /// falls back to the base order on its own.
    pub async fn recommend(&self, query: &RecommendationQuery) -> AppResult<Vec<Candidate>> {
        if query.top_n == 0 {
            return Err(AppError::InvalidInput(
                "top_n must be a positive integer".to_string(),
            ));
        }

        let start = Instant::now();

        let history = self.history.rated_completed().await?;
        let profile = PreferenceProfile::from_history(&history);
        let engagement = EngagementSets::load(&self.history).await?;
        let catalog = self.catalog.fetch_all().await?;
        let catalog_size = catalog.len();

        let mut candidates = rank_candidates(
            catalog,
            &profile,
            &engagement,
            query.desired_genre.as_deref(),
            query.top_n,
        );

        if query.rerank {
            candidates = self.rerank(query, candidates).await;
        }

        tracing::info!(
            catalog_size,
            profile_terms = profile.len(),
            returned = candidates.len(),
            genre = ?query.desired_genre,
            reranked = query.rerank,
            processing_time_ms = start.elapsed().as_millis(),
            "Recommendations computed"
        );

        Ok(candidates)
    }

    async fn rerank(&self, query: &RecommendationQuery, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let Some(reranker) = &self.reranker else {
            tracing::warn!("Re-ranking requested but no re-ranker is configured, keeping base order");
            return candidates;
        };

        if candidates.is_empty() {
            return candidates;
        }

        let summaries: Vec<CandidateSummary> = candidates.iter().map(CandidateSummary::from).collect();
        let query_text = query.desired_genre.as_deref().unwrap_or(DEFAULT_RERANK_QUERY);

        let ids = reranker.rerank(query_text, &summaries).await;

        tracing::debug!(reranker = reranker.name(), ids = ?ids, "Re-ranked candidates");

        apply_reranking(candidates, &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use crate::services::reranker::MockReranker;
    use std::collections::HashSet;

    fn media(id: i64, genres: &[&str], tags: Vec<Tag>, average_score: Option<i64>) -> MediaItem {
        let mut item = MediaItem::new(id);
        item.genres = genres.iter().map(|g| g.to_string()).collect();
        item.tags = tags;
        item.average_score = average_score;
        item
    }

    fn profile(terms: &[(&str, f64)]) -> PreferenceProfile {
        terms.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    fn ids(candidates: &[Candidate]) -> Vec<i64> {
        candidates.iter().map(|c| c.media.id).collect()
    }

    #[test]
    fn test_watched_items_are_excluded() {
        let catalog = vec![
            media(1, &["Action"], vec![], Some(99)),
            media(2, &["Action"], vec![], Some(10)),
        ];
        let engagement = EngagementSets::new(HashSet::new(), HashSet::from([1]));

        let ranked = rank_candidates(catalog, &profile(&[("Action", 10.0)]), &engagement, None, 10);
        assert_eq!(ids(&ranked), vec![2]);
    }

    #[test]
    fn test_watched_exclusion_wins_over_planned() {
        let catalog = vec![media(1, &["Action"], vec![], None)];
        let engagement = EngagementSets::new(HashSet::from([1]), HashSet::from([1]));

        let ranked = rank_candidates(catalog, &profile(&[]), &engagement, None, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_planned_boost_multiplies_by_one_and_a_half() {
        let catalog = vec![media(1, &["Drama"], vec![], Some(50))];
        let engagement = EngagementSets::new(HashSet::from([1]), HashSet::new());
        let profile = profile(&[("Drama", 4.0)]);

        let base = compute_similarity(&catalog[0], &profile);
        let ranked = rank_candidates(catalog, &profile, &engagement, None, 10);
        assert_eq!(ranked[0].score, base * 1.5);
    }

    #[test]
    fn test_genre_filter_drops_non_matching_items() {
        let catalog = vec![
            media(1, &["Action"], vec![], None),
            media(2, &["Comedy"], vec![], None),
            media(3, &[], vec![Tag::ranked("comedy", 30)], None),
        ];

        let ranked = rank_candidates(
            catalog,
            &profile(&[]),
            &EngagementSets::default(),
            Some("COMEDY"),
            10,
        );
        assert_eq!(ids(&ranked), vec![2, 3]);
    }

    #[test]
    fn test_genre_boost_takes_precedence_over_tag_boost() {
        let item = media(1, &["Comedy"], vec![Tag::ranked("Comedy", 100)], Some(60));
        let profile = profile(&[("Comedy", 5.0)]);
        let base = compute_similarity(&item, &profile);

        let ranked = rank_candidates(vec![item], &profile, &EngagementSets::default(), Some("comedy"), 10);
        assert_eq!(ranked[0].score, base * 1.2);
    }

    #[test]
    fn test_tag_only_match_gets_smaller_boost() {
        let item = media(1, &["Action"], vec![Tag::ranked("Time Travel", 80)], Some(70));
        let profile = profile(&[("Time Travel", 9.0)]);
        let base = compute_similarity(&item, &profile);

        let ranked = rank_candidates(
            vec![item],
            &profile,
            &EngagementSets::default(),
            Some("time travel"),
            10,
        );
        assert_eq!(ranked[0].score, base * 1.1);
    }

    #[test]
    fn test_genre_and_planned_boosts_stack() {
        let item = media(1, &["Horror"], vec![], Some(40));
        let profile = profile(&[("Horror", 2.0)]);
        let base = compute_similarity(&item, &profile);
        let engagement = EngagementSets::new(HashSet::from([1]), HashSet::new());

        let ranked = rank_candidates(vec![item], &profile, &engagement, Some("Horror"), 10);
        assert_eq!(ranked[0].score, base * 1.2 * 1.5);
    }

    #[test]
    fn test_top_n_truncation_with_stable_ties() {
        // ids 0..100, scores cycle through 0..10 so many items tie
        let catalog: Vec<MediaItem> = (0..100)
            .map(|id| media(id, &[], vec![], Some(id % 10)))
            .collect();

        let ranked = rank_candidates(catalog, &profile(&[]), &EngagementSets::default(), None, 3);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ids(&ranked), vec![9, 19, 29]);
    }

    #[test]
    fn test_sorted_descending() {
        let catalog = vec![
            media(1, &[], vec![], Some(10)),
            media(2, &[], vec![], Some(90)),
            media(3, &[], vec![], Some(50)),
        ];

        let ranked = rank_candidates(catalog, &profile(&[]), &EngagementSets::default(), None, 10);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_catalog_yields_empty_result() {
        let ranked = rank_candidates(vec![], &profile(&[]), &EngagementSets::default(), None, 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let catalog: Vec<MediaItem> = (0..20)
            .map(|id| {
                media(
                    id,
                    &["Action", "Sci-Fi"],
                    vec![Tag::ranked("Mecha", id * 5)],
                    Some(id * 3 % 17),
                )
            })
            .collect();
        let profile = profile(&[("Action", 3.0), ("Mecha", 7.0)]);
        let engagement = EngagementSets::new(HashSet::from([4, 8]), HashSet::from([2]));

        let first = rank_candidates(catalog.clone(), &profile, &engagement, Some("mecha"), 5);
        let second = rank_candidates(catalog, &profile, &engagement, Some("mecha"), 5);
        assert_eq!(first, second);
    }

    async fn seeded_service() -> (tempfile::TempDir, RecommendationService) {
        use crate::db::create_pool;
        use crate::models::{HistoryEntry, ListStatus};

        let dir = tempfile::tempdir().unwrap();
        let history = HistoryStore::new(create_pool(&dir.path().join("personal.db")).await.unwrap());
        let catalog = CatalogStore::new(create_pool(&dir.path().join("global.db")).await.unwrap());
        history.ensure_schema().await.unwrap();
        catalog.ensure_schema().await.unwrap();

        history
            .upsert_media(&media(100, &["Action"], vec![], None))
            .await
            .unwrap();
        history
            .add_entry(&HistoryEntry {
                media_id: 100,
                status: ListStatus::Completed,
                score: Some(9.0),
            })
            .await
            .unwrap();

        let page: Vec<crate::models::ApiMedia> = serde_json::from_value(serde_json::json!([
            {"id": 100, "genres": ["Action"], "averageScore": 90},
            {"id": 101, "genres": ["Action"], "averageScore": 60},
            {"id": 102, "genres": ["Drama"], "averageScore": 80}
        ]))
        .unwrap();
        catalog.upsert_page(&page).await.unwrap();

        (dir, RecommendationService::new(history, catalog))
    }

    #[tokio::test]
    async fn test_recommend_reads_stores() {
        let (_dir, service) = seeded_service().await;

        let result = service.recommend(&RecommendationQuery::new(10)).await.unwrap();

        // 100 is completed and therefore excluded
        assert_eq!(ids(&result), vec![101, 102]);
        assert_eq!(result[0].score, 9.0 + 60.0 * 0.1);
    }

    #[tokio::test]
    async fn test_recommend_rejects_zero_top_n() {
        let (_dir, service) = seeded_service().await;

        let result = service.recommend(&RecommendationQuery::new(0)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_recommend_applies_reranker_order() {
        let (_dir, service) = seeded_service().await;

        let mut reranker = MockReranker::new();
        reranker
            .expect_rerank()
            .withf(|query, candidates| query == "general recommendations" && candidates.len() == 2)
            .times(1)
            .returning(|_, _| vec![102, 101]);
        reranker.expect_name().return_const("mock");

        let service = service.with_reranker(Arc::new(reranker));
        let result = service
            .recommend(&RecommendationQuery::new(10).with_rerank(true))
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![102, 101]);
    }

    #[tokio::test]
    async fn test_recommend_skips_reranker_unless_requested() {
        let (_dir, service) = seeded_service().await;

        let mut reranker = MockReranker::new();
        reranker.expect_rerank().never();

        let service = service.with_reranker(Arc::new(reranker));
        let result = service.recommend(&RecommendationQuery::new(10)).await.unwrap();

        assert_eq!(ids(&result), vec![101, 102]);
    }

    #[tokio::test]
    async fn test_recommend_without_reranker_keeps_order() {
        let (_dir, service) = seeded_service().await;

        let result = service
            .recommend(&RecommendationQuery::new(10).with_rerank(true))
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![101, 102]);
    }
}
