//! News API endpoints
//!
//! - GET /api/v1/news - Newest first
//! - GET /api/v1/news/{id}
//! - POST /api/v1/news - Publish (auth)
//! - POST /api/v1/news/{id}/illustration - Generate a cover image (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::api::specialties::IllustrationResponse;
use crate::models::{CreateNewsInput, News};

#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub news: Vec<News>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news))
        .route("/{id}", get(get_news))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_news))
        .route("/{id}/illustration", post(generate_illustration))
}

async fn list_news(State(state): State<AppState>) -> Result<Json<NewsListResponse>, ApiError> {
    let news = state.news_service.list().await?;
    Ok(Json(NewsListResponse { news }))
}

async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<News>, ApiError> {
    Ok(Json(state.news_service.require(&id).await?))
}

async fn create_news(
    State(state): State<AppState>,
    Json(body): Json<CreateNewsInput>,
) -> Result<(StatusCode, Json<News>), ApiError> {
    let news = state.news_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(news)))
}

async fn generate_illustration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IllustrationResponse>, ApiError> {
    let outcome = state.news_service.generate_illustration(&id).await?;
    Ok(Json(outcome.into()))
}
