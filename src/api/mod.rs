//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - Health check
//! - Hospital, specialty and news endpoints
//! - Auth endpoints (register, login, profile)
//! - Appointment endpoints (owner-scoped)
//!
//! Any other path is served from the static front-end directory, falling
//! back to its `index.html` so client-side routes resolve.

pub mod appointments;
pub mod auth;
pub mod hospitals;
pub mod middleware;
pub mod news;
pub mod specialties;

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
}

/// GET /api/v1/health - Database round trip
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.pool.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {:#}", e);
        ApiError::internal_error("Database unavailable")
    })?;

    Ok(Json(HealthResponse {
        status: "ok",
        database: format!("{:?}", state.pool.driver()).to_lowercase(),
    }))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/appointments", appointments::router())
        .nest("/hospitals", hospitals::protected_router())
        .nest("/specialties", specialties::protected_router())
        .nest("/news", news::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::public_router())
        .nest("/hospitals", hospitals::public_router())
        .nest("/specialties", specialties::public_router())
        .nest("/news", news::public_router())
        .merge(protected_routes)
        .fallback(api_not_found)
}

/// Build the complete router with middleware
///
/// # Errors
///
/// Fails when `cors_origin` is not a valid header value.
pub fn build_router(state: AppState, server: &ServerConfig) -> anyhow::Result<Router> {
    let origin = server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", server.cors_origin))?;

    // Cookie-based sessions need credentials, so the origin must be explicit
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let static_files = ServeDir::new(&server.static_dir)
        .fallback(ServeFile::new(server.static_dir.join("index.html")));

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
