use std::collections::HashSet;

use crate::{db::HistoryStore, error::AppResult};

/// Media ids the user plans to watch and ids the user already engaged with
///
/// The two sets come from independent queries. Duplicate history rows with
/// different statuses can put an id in both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementSets {
    pub planned: HashSet<i64>,
    pub watched: HashSet<i64>,
}

impl EngagementSets {
    pub fn new(planned: HashSet<i64>, watched: HashSet<i64>) -> Self {
        Self { planned, watched }
    }

    pub async fn load(store: &HistoryStore) -> AppResult<Self> {
        let planned = store.planned_ids().await?;
        let watched = store.watched_ids().await?;

        tracing::debug!(
            planned = planned.len(),
            watched = watched.len(),
            "Loaded engagement sets"
        );

        Ok(Self { planned, watched })
    }

    pub fn is_planned(&self, media_id: i64) -> bool {
        self.planned.contains(&media_id)
    }

    pub fn is_watched(&self, media_id: i64) -> bool {
        self.watched.contains(&media_id)
    }
}
