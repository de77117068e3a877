use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite file holding the user's list entries (history store)
    #[serde(default = "default_personal_db_path")]
    pub personal_db_path: PathBuf,

    /// SQLite file holding the global media catalog
    #[serde(default = "default_global_db_path")]
    pub global_db_path: PathBuf,

    /// AniList GraphQL endpoint
    #[serde(default = "default_anilist_api_url")]
    pub anilist_api_url: String,

    /// Media items requested per catalog page
    #[serde(default = "default_ingest_per_page")]
    pub ingest_per_page: u32,

    /// Pause between successfully stored pages
    #[serde(default = "default_ingest_page_delay_ms")]
    pub ingest_page_delay_ms: u64,

    /// Wait before retrying a page that failed
    #[serde(default = "default_ingest_retry_backoff_secs")]
    pub ingest_retry_backoff_secs: u64,

    /// File holding the last successfully stored page
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Gemini API key; re-ranking is unavailable without it
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model used for re-ranking
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Number of recommendations returned when the caller does not ask for a count
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_personal_db_path() -> PathBuf {
    PathBuf::from("anilist_data.db")
}

fn default_global_db_path() -> PathBuf {
    PathBuf::from("anilist_global.db")
}

fn default_anilist_api_url() -> String {
    "https://graphql.anilist.co".to_string()
}

fn default_ingest_per_page() -> u32 {
    50
}

fn default_ingest_page_delay_ms() -> u64 {
    1000
}

fn default_ingest_retry_backoff_secs() -> u64 {
    60
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("checkpoint.txt")
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-8b".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn ingest_page_delay(&self) -> Duration {
        Duration::from_millis(self.ingest_page_delay_ms)
    }

    pub fn ingest_retry_backoff(&self) -> Duration {
        Duration::from_secs(self.ingest_retry_backoff_secs)
    }
}
