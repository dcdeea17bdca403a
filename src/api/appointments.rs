//! Appointment API endpoints
//!
//! All routes require authentication and only ever touch the caller's own
//! appointments.
//!
//! - GET /api/v1/appointments[?date=YYYY-MM-DD]
//! - POST /api/v1/appointments
//! - GET /api/v1/appointments/{id}
//! - PUT /api/v1/appointments/{id}
//! - DELETE /api/v1/appointments/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Appointment, CreateAppointmentInput, UpdateAppointmentInput};

/// Query parameters for listing appointments
#[derive(Debug, Deserialize)]
pub struct ListAppointmentsQuery {
    /// Restrict to one UTC calendar day
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route(
            "/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

/// GET /api/v1/appointments
async fn list_appointments(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    let appointments = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ApiError::validation_error(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
            })?;
            state
                .appointment_service
                .list_by_date(date, &user.0.id)
                .await?
        }
        None => state.appointment_service.list(&user.0.id).await?,
    };

    Ok(Json(AppointmentListResponse { appointments }))
}

/// POST /api/v1/appointments
async fn create_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateAppointmentInput>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let appointment = state
        .appointment_service
        .create(body, &user.0.id)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// GET /api/v1/appointments/{id}
async fn get_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state.appointment_service.get(&id, &user.0.id).await?;
    Ok(Json(appointment))
}

/// PUT /api/v1/appointments/{id}
async fn update_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateAppointmentInput>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = state
        .appointment_service
        .update(&id, body, &user.0.id)
        .await?;
    Ok(Json(appointment))
}

/// DELETE /api/v1/appointments/{id}
async fn delete_appointment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.appointment_service.delete(&id, &user.0.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
