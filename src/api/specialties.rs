//! Specialty API endpoints
//!
//! - GET /api/v1/specialties - List specialties
//! - GET /api/v1/specialties/{id} - Get one specialty
//! - POST /api/v1/specialties - Create a specialty (auth)
//! - POST /api/v1/specialties/{id}/illustration - Generate its icon (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateSpecialtyInput, Specialty};
use crate::services::IllustrationOutcome;

#[derive(Debug, Serialize)]
pub struct SpecialtyListResponse {
    pub specialties: Vec<Specialty>,
}

/// Result of an illustration request.
///
/// `available` is false when image generation is not configured; the record
/// is then left untouched and `image_url` is null.
#[derive(Debug, Serialize)]
pub struct IllustrationResponse {
    pub available: bool,
    pub image_url: Option<String>,
}

impl From<IllustrationOutcome> for IllustrationResponse {
    fn from(outcome: IllustrationOutcome) -> Self {
        match outcome {
            IllustrationOutcome::Generated { url } => Self {
                available: true,
                image_url: Some(url),
            },
            IllustrationOutcome::Unavailable => Self {
                available: false,
                image_url: None,
            },
        }
    }
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_specialties))
        .route("/{id}", get(get_specialty))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_specialty))
        .route("/{id}/illustration", post(generate_illustration))
}

/// GET /api/v1/specialties
async fn list_specialties(
    State(state): State<AppState>,
) -> Result<Json<SpecialtyListResponse>, ApiError> {
    let specialties = state.specialty_service.list().await?;
    Ok(Json(SpecialtyListResponse { specialties }))
}

/// GET /api/v1/specialties/{id}
async fn get_specialty(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Specialty>, ApiError> {
    let specialty = state.specialty_service.require(&id).await?;
    Ok(Json(specialty))
}

/// POST /api/v1/specialties
async fn create_specialty(
    State(state): State<AppState>,
    Json(body): Json<CreateSpecialtyInput>,
) -> Result<(StatusCode, Json<Specialty>), ApiError> {
    let specialty = state.specialty_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(specialty)))
}

/// POST /api/v1/specialties/{id}/illustration
async fn generate_illustration(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IllustrationResponse>, ApiError> {
    let outcome = state.specialty_service.generate_illustration(&id).await?;
    Ok(Json(outcome.into()))
}
