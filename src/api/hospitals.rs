//! Hospital API endpoints
//!
//! - GET /api/v1/hospitals - List hospitals
//! - GET /api/v1/hospitals/{id} - Get one hospital
//! - POST /api/v1/hospitals - Create a hospital (auth)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateHospitalInput, Hospital};

#[derive(Debug, Serialize)]
pub struct HospitalListResponse {
    pub hospitals: Vec<Hospital>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_hospitals))
        .route("/{id}", get(get_hospital))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/", axum::routing::post(create_hospital))
}

/// GET /api/v1/hospitals
async fn list_hospitals(
    State(state): State<AppState>,
) -> Result<Json<HospitalListResponse>, ApiError> {
    let hospitals = state.hospital_service.list().await?;
    Ok(Json(HospitalListResponse { hospitals }))
}

/// GET /api/v1/hospitals/{id}
async fn get_hospital(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Hospital>, ApiError> {
    let hospital = state.hospital_service.require(&id).await?;
    Ok(Json(hospital))
}

/// POST /api/v1/hospitals
async fn create_hospital(
    State(state): State<AppState>,
    Json(body): Json<CreateHospitalInput>,
) -> Result<(StatusCode, Json<Hospital>), ApiError> {
    let hospital = state.hospital_service.create(body).await?;
    Ok((StatusCode::CREATED, Json(hospital)))
}
