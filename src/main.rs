use std::io::{BufRead, IsTerminal, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use anirec::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, CatalogStore, HistoryStore},
    models::RecommendationQuery,
    services::{
        providers::AniListProvider, CatalogIngestor, Checkpoint, GeminiClient, LlmReranker,
        RecommendationService,
    },
};

#[derive(Parser)]
#[command(name = "anirec", version, about = "Anime recommendations from your AniList history")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the top recommendations
    Recommend {
        /// Only recommend media with this genre or tag (case-insensitive)
        #[arg(long)]
        genre: Option<String>,
        /// Number of recommendations to print
        #[arg(long)]
        top_n: Option<usize>,
        /// Re-order the results with the language model re-ranker
        #[arg(long)]
        rerank: bool,
    },
    /// Populate the global catalog from AniList
    Ingest,
    /// Serve recommendations over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anirec=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Recommend {
            genre,
            top_n,
            rerank,
        } => {
            let genre = match genre {
                Some(genre) => Some(genre),
                None => prompt_genre()?,
            };
            recommend(&config, genre, top_n, rerank).await
        }
        Command::Ingest => ingest(&config).await,
        Command::Serve => serve(&config).await,
    }
}

async fn build_service(config: &Config) -> anyhow::Result<RecommendationService> {
    let history = HistoryStore::new(create_pool(&config.personal_db_path).await?);
    let catalog = CatalogStore::new(create_pool(&config.global_db_path).await?);
    history.ensure_schema().await?;
    catalog.ensure_schema().await?;

    let mut service = RecommendationService::new(history, catalog);

    match &config.gemini_api_key {
        Some(api_key) => {
            let client = GeminiClient::new(
                api_key.clone(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            );
            service = service.with_reranker(Arc::new(LlmReranker::new(client)));
        }
        None => tracing::debug!("GEMINI_API_KEY not set, re-ranking unavailable"),
    }

    Ok(service)
}

/// Asks for a genre filter when attached to a terminal
fn prompt_genre() -> anyhow::Result<Option<String>> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(None);
    }

    print!("Enter a genre filter (or press enter to skip): ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(Some(line))
}

async fn recommend(
    config: &Config,
    genre: Option<String>,
    top_n: Option<usize>,
    rerank: bool,
) -> anyhow::Result<()> {
    let service = build_service(config).await?;
    let query = RecommendationQuery::new(top_n.unwrap_or(config.default_top_n))
        .with_genre(genre)
        .with_rerank(rerank);

    let recommendations = service.recommend(&query).await?;

    println!("Top Recommendations:");
    for candidate in &recommendations {
        println!(
            "{} (Similarity Score: {:.2})",
            candidate.media.display_title(),
            candidate.score
        );
    }

    Ok(())
}

async fn ingest(config: &Config) -> anyhow::Result<()> {
    let store = CatalogStore::new(create_pool(&config.global_db_path).await?);
    let provider = Arc::new(AniListProvider::new(config.anilist_api_url.clone()));

    let summary = CatalogIngestor::new(
        provider,
        store,
        Checkpoint::new(config.checkpoint_path.clone()),
        config.ingest_per_page,
    )
    .with_page_delay(config.ingest_page_delay())
    .with_retry_backoff(config.ingest_retry_backoff())
    .run()
    .await?;

    println!(
        "Global data ingestion completed! Stored {} media across {} pages.",
        summary.media_stored, summary.pages_stored
    );

    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(build_service(config).await?, config.default_top_n);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
