use std::fmt::Display;

use super::Tag;

/// List membership state of a history entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListStatus {
    Current,
    Planning,
    Completed,
    Dropped,
    Paused,
    Repeating,
    Other(String),
}

impl ListStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ListStatus::Current => "CURRENT",
            ListStatus::Planning => "PLANNING",
            ListStatus::Completed => "COMPLETED",
            ListStatus::Dropped => "DROPPED",
            ListStatus::Paused => "PAUSED",
            ListStatus::Repeating => "REPEATING",
            ListStatus::Other(status) => status,
        }
    }
}

impl From<&str> for ListStatus {
    fn from(status: &str) -> Self {
        match status {
            "CURRENT" => ListStatus::Current,
            "PLANNING" => ListStatus::Planning,
            "COMPLETED" => ListStatus::Completed,
            "DROPPED" => ListStatus::Dropped,
            "PAUSED" => ListStatus::Paused,
            "REPEATING" => ListStatus::Repeating,
            other => ListStatus::Other(other.to_string()),
        }
    }
}

impl Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (user, media) relationship record
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub media_id: i64,
    pub status: ListStatus,
    pub score: Option<f64>,
}

/// A completed, scored history entry joined with its media's genres and tags
#[derive(Debug, Clone, PartialEq)]
pub struct RatedMedia {
    pub genres: Vec<String>,
    pub tags: Vec<Tag>,
    pub score: f64,
}
