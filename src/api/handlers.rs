use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{BookRecord, RecommendationResponse, SimilarityStatus, Strategy},
};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub k: Option<usize>,
    pub strategy: Option<Strategy>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// All books in catalog order
pub async fn list_books(State(state): State<AppState>) -> Json<Vec<BookRecord>> {
    Json(state.inner.catalog.books().to_vec())
}

/// First `limit` books in catalog order
pub async fn list_popular(
    State(state): State<AppState>,
    query: Result<Query<PopularQuery>, QueryRejection>,
) -> AppResult<Json<Vec<BookRecord>>> {
    let Query(params) = query?;
    let limits = state.inner.limits;
    let limit = params.limit.unwrap_or(limits.popular);
    if limit > limits.max_k {
        return Err(AppError::InvalidInput(format!(
            "limit must be at most {}",
            limits.max_k
        )));
    }

    Ok(Json(state.inner.catalog.popular(limit).to_vec()))
}

/// Books similar to the requested title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(params) = query?;
    let strategy = params.strategy.unwrap_or(state.inner.default_strategy);
    let k = params.k.unwrap_or_else(|| state.default_k(strategy));

    if k == 0 || k > state.inner.limits.max_k {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            state.inner.limits.max_k
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        strategy = %strategy,
        "Processing recommendation request"
    );

    let recommender = state.strategy(strategy)?;
    let recommendations = recommender.similar(&params.title, k).await.map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Recommendation failed");
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        returned = recommendations.len(),
        "Recommendation completed"
    );

    Ok(Json(RecommendationResponse {
        title: params.title,
        strategy,
        recommendations,
    }))
}

/// Build status of the content model
pub async fn similarity_status(State(state): State<AppState>) -> Json<SimilarityStatus> {
    Json(state.inner.content.status())
}
