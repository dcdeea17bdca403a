//! Authentication API endpoints
//!
//! - POST /api/v1/auth/register - Register and sign in
//! - POST /api/v1/auth/login - Sign in
//! - POST /api/v1/auth/logout - Sign out
//! - GET /api/v1/auth/me - Current user
//! - PUT /api/v1/auth/profile - Change email or phone
//! - PUT /api/v1/auth/password - Change password

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{extract_session_token, ApiError, AppState, AuthenticatedUser};
use crate::models::{CreateUserInput, Session, UpdateProfileInput, User};
use crate::services::{ChangePasswordInput, LoginInput};

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .route("/profile", put(update_profile))
        .route("/password", put(change_password))
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// `Set-Cookie` header carrying the session token
fn session_cookie(session: &Session) -> Result<HeaderMap, ApiError> {
    let max_age = (session.expires_at - session.created_at).num_seconds().max(0);
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, max_age
    );

    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// POST /api/v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(body): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.user_service.register(body).await?;
    let session = state.user_service.create_session(&user.id).await?;
    let headers = session_cookie(&session)?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user,
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.user_service.login(body).await?;

    let user = state
        .user_service
        .get_by_id(&session.user_id)
        .await?
        .ok_or_else(|| ApiError::internal_error("Session user disappeared"))?;
    let headers = session_cookie(&session)?;

    Ok((
        headers,
        Json(AuthResponse {
            user,
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout
async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    state.user_service.logout(&token).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me
async fn get_current_user(user: AuthenticatedUser) -> Json<User> {
    Json(user.0)
}

/// PUT /api/v1/auth/profile
async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<User>, ApiError> {
    let updated = state.user_service.update_profile(&user.0.id, body).await?;
    Ok(Json(updated))
}

/// PUT /api/v1/auth/password
async fn change_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<ChangePasswordInput>,
) -> Result<StatusCode, ApiError> {
    state.user_service.change_password(&user.0.id, body).await?;
    Ok(StatusCode::NO_CONTENT)
}
