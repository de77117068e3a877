use crate::models::MediaItem;

use super::profile::PreferenceProfile;

const AVERAGE_SCORE_FACTOR: f64 = 0.1;
const POPULARITY_DIVISOR: f64 = 1_000_000.0;

/// Affinity between one catalog item and the preference profile
///
/// Summed in order:
/// 1. full profile weight of every matching genre
/// 2. profile weight of every matching tag, scaled by `rank / 100`
/// 3. `average_score * 0.1`
/// 4. `popularity / 1_000_000`
pub fn compute_similarity(media: &MediaItem, profile: &PreferenceProfile) -> f64 {
    let mut score = 0.0;

    for genre in &media.genres {
        if let Some(weight) = profile.weight(genre) {
            score += weight;
        }
    }

    for tag in &media.tags {
        if let Some(weight) = profile.weight(tag.name()) {
            score += weight * (tag.effective_rank() as f64 / 100.0);
        }
    }

    score += media.average_score.unwrap_or(0) as f64 * AVERAGE_SCORE_FACTOR;
    score += media.popularity.unwrap_or(0) as f64 / POPULARITY_DIVISOR;

    score
}
