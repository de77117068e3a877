//! Optional second-pass re-ranking of recommendations by a language model
//!
//! The re-ranker sees short candidate summaries and returns candidate ids in
//! its preferred order. It never fails: any problem obtaining or parsing a
//! reply yields the input order.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::{
    error::AppResult,
    models::{Candidate, CandidateSummary},
};

pub mod gemini;

pub use gemini::GeminiClient;

/// Re-ordering contract used by the recommendation service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Reranker: Send + Sync {
    /// Returns a permutation of the candidate ids in suggested order, or the
    /// input order on failure
    async fn rerank(&self, query: &str, candidates: &[CandidateSummary]) -> Vec<i64>;

    /// Re-ranker name for logging and debugging
    fn name(&self) -> &'static str;
}

/// A text-completion backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    fn name(&self) -> &'static str;
}

/// Re-ranker that prompts a text-completion model
pub struct LlmReranker<C> {
    completion: C,
}

impl<C: TextCompletion> LlmReranker<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }
}

#[async_trait::async_trait]
impl<C: TextCompletion> Reranker for LlmReranker<C> {
    async fn rerank(&self, query: &str, candidates: &[CandidateSummary]) -> Vec<i64> {
        let original_order = || candidates.iter().map(|c| c.id).collect::<Vec<_>>();
        let prompt = build_prompt(query, candidates);

        let reply = match self.completion.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    backend = self.completion.name(),
                    "Re-ranking request failed, keeping original order"
                );
                return original_order();
            }
        };

        tracing::debug!(reply = %reply, "Re-ranking response text");

        match parse_candidate_ids(&reply) {
            Some(ids) => {
                let original = original_order();
                let order = complete_permutation(&ids, &original);
                if order != ids {
                    tracing::debug!(
                        returned = ids.len(),
                        candidates = original.len(),
                        "Re-ranking reply was not a permutation of the candidates, completed it"
                    );
                }
                order
            }
            None => {
                tracing::warn!(
                    backend = self.completion.name(),
                    "Could not parse re-ranking response, keeping original order"
                );
                original_order()
            }
        }
    }

    fn name(&self) -> &'static str {
        self.completion.name()
    }
}

/// Builds the re-ranking instruction listing every candidate
pub fn build_prompt(query: &str, candidates: &[CandidateSummary]) -> String {
    let candidate_lines: Vec<String> = candidates
        .iter()
        .map(|c| {
            format!(
                "ID: {}, Title: {}, Format: {}, Score: {}, Popularity: {}",
                c.id,
                c.title,
                c.format.as_deref().unwrap_or("UNKNOWN"),
                display_number(c.average_score),
                display_number(c.popularity),
            )
        })
        .collect();

    format!(
        "You are an expert anime recommender. Given the following candidate anime details and the user query, \
         please re-rank the candidates so that high-quality TV series (with high average scores and popularity) \
         are prioritized, while penalizing formats like TV_SHORT, OVA, ONA, or SPECIAL.\n\n\
         User Query: {}\n\n\
         Candidates:\n\
         {}\n\n\
         Return your answer as valid JSON with a single key 'candidate_ids' mapping to an array of anime IDs in the desired order.",
        query,
        candidate_lines.join("\n")
    )
}

fn display_number(value: Option<i64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// Extracts `candidate_ids` from a JSON reply
///
/// Ids may be integers or numeric strings. Returns `None` if the reply is not
/// a JSON object, lacks the key, or holds anything that is not an id.
pub fn parse_candidate_ids(reply: &str) -> Option<Vec<i64>> {
    let parsed: Value = serde_json::from_str(reply.trim()).ok()?;
    let ids = parsed.get("candidate_ids")?.as_array()?;

    ids.iter()
        .map(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect()
}

/// Turns re-ranker ids into a full ordering of `original`
///
/// Unknown and repeated ids are ignored; ids the reply leaves out follow in
/// their original order, so the result is always a permutation of `original`.
pub fn complete_permutation(ids: &[i64], original: &[i64]) -> Vec<i64> {
    let known: HashSet<i64> = original.iter().copied().collect();
    let mut seen = HashSet::with_capacity(original.len());

    ids.iter()
        .chain(original)
        .copied()
        .filter(|id| known.contains(id) && seen.insert(*id))
        .collect()
}

/// Reorders ranked candidates by the re-ranker's ids
///
/// See [`complete_permutation`] for how partial replies are handled.
pub fn apply_reranking(candidates: Vec<Candidate>, ids: &[i64]) -> Vec<Candidate> {
    let original_ids: Vec<i64> = candidates.iter().map(|c| c.media.id).collect();
    let mut by_id: HashMap<i64, Candidate> = candidates
        .into_iter()
        .map(|candidate| (candidate.media.id, candidate))
        .collect();

    complete_permutation(ids, &original_ids)
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::MediaItem;

    fn summaries() -> Vec<CandidateSummary> {
        vec![
            CandidateSummary {
                id: 1,
                title: "Frieren".to_string(),
                format: Some("TV".to_string()),
                average_score: Some(90),
                popularity: Some(400_000),
            },
            CandidateSummary {
                id: 2,
                title: "Pop Team Epic".to_string(),
                format: Some("TV_SHORT".to_string()),
                average_score: None,
                popularity: Some(90_000),
            },
            CandidateSummary {
                id: 3,
                title: "Mob Psycho 100".to_string(),
                format: None,
                average_score: Some(84),
                popularity: None,
            },
        ]
    }

    fn candidate(id: i64) -> Candidate {
        Candidate {
            media: MediaItem::new(id),
            score: id as f64,
        }
    }

    fn completion_returning(reply: AppResult<String>) -> MockTextCompletion {
        let mut completion = MockTextCompletion::new();
        let mut reply = Some(reply);
        completion
            .expect_complete()
            .times(1)
            .returning(move |_| reply.take().unwrap());
        completion.expect_name().return_const("mock");
        completion
    }

    #[test]
    fn test_prompt_lists_candidates() {
        let prompt = build_prompt("Comedy", &summaries());

        assert!(prompt.contains("User Query: Comedy"));
        assert!(prompt.contains("ID: 1, Title: Frieren, Format: TV, Score: 90, Popularity: 400000"));
        assert!(prompt.contains("ID: 2, Title: Pop Team Epic, Format: TV_SHORT, Score: unknown"));
        assert!(prompt.contains("ID: 3, Title: Mob Psycho 100, Format: UNKNOWN"));
        assert!(prompt.contains("'candidate_ids'"));
    }

    #[test]
    fn test_parse_accepts_numbers_and_numeric_strings() {
        assert_eq!(
            parse_candidate_ids(r#"{"candidate_ids": [3, "1", 2]}"#),
            Some(vec![3, 1, 2])
        );
    }

    #[test]
    fn test_parse_rejects_malformed_replies() {
        assert_eq!(parse_candidate_ids("Sure! Here is the ranking: 3, 1, 2"), None);
        assert_eq!(parse_candidate_ids(r#"{"ids": [3, 1, 2]}"#), None);
        assert_eq!(parse_candidate_ids(r#"{"candidate_ids": "3,1,2"}"#), None);
        assert_eq!(parse_candidate_ids(r#"{"candidate_ids": [3, "one", 2]}"#), None);
        assert_eq!(parse_candidate_ids(r#"[3, 1, 2]"#), None);
    }

    #[tokio::test]
    async fn test_rerank_uses_parsed_order() {
        let reranker = LlmReranker::new(completion_returning(Ok(
            r#"{"candidate_ids": [3, 1, 2]}"#.to_string(),
        )));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_rerank_completes_partial_reply() {
        let reranker = LlmReranker::new(completion_returning(Ok(
            r#"{"candidate_ids": [99, 3]}"#.to_string(),
        )));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_rerank_ignores_repeated_ids() {
        let reranker = LlmReranker::new(completion_returning(Ok(
            r#"{"candidate_ids": [2, 2, "2", 1]}"#.to_string(),
        )));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![2, 1, 3]);
    }

    #[test]
    fn test_complete_permutation_drops_unknown_ids() {
        assert_eq!(complete_permutation(&[7, 8], &[1, 2]), vec![1, 2]);
        assert_eq!(complete_permutation(&[], &[]), Vec::<i64>::new());
    }

    #[tokio::test]
    async fn test_rerank_falls_back_on_invalid_reply() {
        let reranker = LlmReranker::new(completion_returning(Ok("not json at all".to_string())));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rerank_falls_back_on_missing_key() {
        let reranker = LlmReranker::new(completion_returning(Ok(r#"{"ranking": [2]}"#.to_string())));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rerank_falls_back_on_transport_error() {
        let reranker = LlmReranker::new(completion_returning(Err(AppError::ExternalApi(
            "Gemini returned status 503".to_string(),
        ))));

        assert_eq!(reranker.rerank("anything", &summaries()).await, vec![1, 2, 3]);
    }

    #[test]
    fn test_apply_reranking_reorders() {
        let reordered = apply_reranking(vec![candidate(1), candidate(2), candidate(3)], &[3, 1, 2]);
        let ids: Vec<i64> = reordered.iter().map(|c| c.media.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        // scores travel with their candidates
        assert_eq!(reordered[0].score, 3.0);
    }

    #[test]
    fn test_apply_reranking_keeps_a_permutation() {
        let reordered = apply_reranking(
            vec![candidate(1), candidate(2), candidate(3), candidate(4)],
            &[4, 99, 4, 2],
        );
        let ids: Vec<i64> = reordered.iter().map(|c| c.media.id).collect();
        assert_eq!(ids, vec![4, 2, 1, 3]);
    }

    #[test]
    fn test_apply_reranking_with_no_ids_is_identity() {
        let reordered = apply_reranking(vec![candidate(5), candidate(6)], &[]);
        let ids: Vec<i64> = reordered.iter().map(|c| c.media.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }
}
