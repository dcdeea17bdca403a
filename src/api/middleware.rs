//! API middleware
//!
//! Shared handler state, the JSON error envelope and session authentication.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{DynDatabasePool, Storage};
use crate::models::User;
use crate::services::{
    AppointmentService, AppointmentServiceError, HospitalService, HospitalServiceError,
    IllustrationError, IllustrationService, NewsService, NewsServiceError, SpecialtyService,
    SpecialtyServiceError, UserService, UserServiceError,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub hospital_service: Arc<HospitalService>,
    pub specialty_service: Arc<SpecialtyService>,
    pub news_service: Arc<NewsService>,
    pub appointment_service: Arc<AppointmentService>,
    pub user_service: Arc<UserService>,
}

impl AppState {
    /// Wire every service to its repositories.
    ///
    /// `pool` is only used for health checks; all data access goes through
    /// `storage`.
    pub fn new(
        pool: DynDatabasePool,
        storage: Storage,
        illustrations: Arc<IllustrationService>,
    ) -> Self {
        Self {
            pool,
            hospital_service: Arc::new(HospitalService::new(storage.hospitals.clone())),
            specialty_service: Arc::new(SpecialtyService::new(
                storage.specialties.clone(),
                illustrations.clone(),
            )),
            news_service: Arc::new(NewsService::new(storage.news.clone(), illustrations)),
            appointment_service: Arc::new(AppointmentService::new(
                storage.appointments,
                storage.hospitals,
                storage.specialties,
            )),
            user_service: Arc::new(UserService::new(storage.users, storage.sessions)),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    /// The upstream image provider failed
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log an internal failure and hide its details from the client
    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Request failed: {:#}", err);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<HospitalServiceError> for ApiError {
    fn from(err: HospitalServiceError) -> Self {
        match err {
            HospitalServiceError::NotFound(_) => Self::not_found(err.to_string()),
            HospitalServiceError::ValidationError(msg) => Self::validation_error(msg),
            HospitalServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<IllustrationError> for ApiError {
    fn from(err: IllustrationError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl From<SpecialtyServiceError> for ApiError {
    fn from(err: SpecialtyServiceError) -> Self {
        match err {
            SpecialtyServiceError::NotFound(_) => Self::not_found(err.to_string()),
            SpecialtyServiceError::ValidationError(msg) => Self::validation_error(msg),
            SpecialtyServiceError::Illustration(e) => e.into(),
            SpecialtyServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<NewsServiceError> for ApiError {
    fn from(err: NewsServiceError) -> Self {
        match err {
            NewsServiceError::NotFound(_) => Self::not_found(err.to_string()),
            NewsServiceError::ValidationError(msg) => Self::validation_error(msg),
            NewsServiceError::Illustration(e) => e.into(),
            NewsServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<AppointmentServiceError> for ApiError {
    fn from(err: AppointmentServiceError) -> Self {
        match err {
            AppointmentServiceError::NotFound(_) => Self::not_found("Appointment not found"),
            AppointmentServiceError::ValidationError(msg) => Self::validation_error(msg),
            AppointmentServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::AuthenticationError(msg) => Self::unauthorized(msg),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::UserExists(msg) => Self::conflict(msg),
            UserServiceError::NotFound => Self::not_found("User not found"),
            UserServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie.
///
/// The bearer header wins when both are present.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let user = state
        .user_service
        .validate_session(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
