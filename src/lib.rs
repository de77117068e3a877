//! Personal anime recommendations from a rated AniList history.
//!
//! A preference profile is built from completed, scored list entries, every
//! catalog item is scored against it, and the best matches are returned,
//! optionally filtered by genre and re-ordered by a language model. The
//! catalog itself is filled by a resumable ingestion job.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
