use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{RecommendationQuery, RecommendationResponse},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub genre: Option<String>,
    pub top_n: Option<usize>,
    #[serde(default)]
    pub rerank: bool,
}

#[derive(Debug, Serialize)]
pub struct CatalogStatsResponse {
    pub media_count: i64,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Top recommendations for the user, optionally filtered by genre and re-ranked
pub async fn get_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<Vec<RecommendationResponse>>> {
    let query = RecommendationQuery::new(params.top_n.unwrap_or(state.default_top_n))
        .with_genre(params.genre)
        .with_rerank(params.rerank);

    tracing::info!(
        request_id = %request_id,
        top_n = query.top_n,
        genre = ?query.desired_genre,
        rerank = query.rerank,
        "Processing recommendation request"
    );

    let candidates = state.recommendations.recommend(&query).await?;

    Ok(Json(
        candidates.iter().map(RecommendationResponse::from).collect(),
    ))
}

/// Size of the global catalog
pub async fn catalog_stats(State(state): State<AppState>) -> AppResult<Json<CatalogStatsResponse>> {
    let media_count = state.recommendations.catalog().count().await?;
    Ok(Json(CatalogStatsResponse { media_count }))
}
