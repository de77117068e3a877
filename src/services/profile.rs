use std::collections::HashMap;

use crate::models::RatedMedia;

/// Accumulated preference weight per genre or tag name
///
/// Genres and tags share one key space, so a label that is both a genre and a
/// tag collects weight from both. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceProfile {
    weights: HashMap<String, f64>,
}

impl PreferenceProfile {
    /// Builds the profile by adding each entry's score to every genre and tag
    /// of its media
    pub fn from_history(history: &[RatedMedia]) -> Self {
        let mut weights: HashMap<String, f64> = HashMap::new();

        for entry in history {
            for genre in &entry.genres {
                *weights.entry(genre.clone()).or_insert(0.0) += entry.score;
            }
            for tag in &entry.tags {
                *weights.entry(tag.name().to_string()).or_insert(0.0) += entry.score;
            }
        }

        tracing::debug!(
            entries = history.len(),
            terms = weights.len(),
            "Built preference profile"
        );

        Self { weights }
    }

    pub fn weight(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(term, weight)| (term.as_str(), *weight))
    }
}

impl FromIterator<(String, f64)> for PreferenceProfile {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}
