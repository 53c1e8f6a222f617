//! API handlers for the asset management REST endpoints

pub mod assets;
pub mod assignments;
pub mod auth;
pub mod categories;
pub mod extract;
pub mod health;
pub mod openapi;
pub mod returning_requests;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, error::ErrorInfo, models::user::UserClaims, query::Page, AppState};

/// Response header carrying the pagination metadata of list endpoints
pub const PAGINATION_HEADER: &str = "x-pagination";

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Envelope of every JSON response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResult<T> {
    pub is_success: bool,
    pub error: Option<ErrorInfo>,
    pub result: Option<T>,
}

impl<T> BaseResult<T> {
    pub fn ok(result: T) -> Self {
        Self {
            is_success: true,
            error: None,
            result: Some(result),
        }
    }

    pub fn failure(error: ErrorInfo) -> Self {
        Self {
            is_success: false,
            error: Some(error),
            result: None,
        }
    }
}

impl BaseResult<()> {
    /// Success without payload (`result: null`)
    pub fn empty() -> Self {
        Self {
            is_success: true,
            error: None,
            result: None,
        }
    }
}

/// A list page: rows in the envelope, metadata in the `X-Pagination` header
pub struct Paged<T>(pub Page<T>);

impl<T: Serialize> IntoResponse for Paged<T> {
    fn into_response(self) -> Response {
        let metadata = self.0.metadata();
        let mut response = Json(BaseResult::ok(self.0.items)).into_response();

        match serde_json::to_string(&metadata)
            .ok()
            .and_then(|json| HeaderValue::from_str(&json).ok())
        {
            Some(value) => {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(PAGINATION_HEADER), value);
            }
            None => tracing::warn!("Failed to encode pagination header"),
        }
        response
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(PAGINATION_HEADER)]);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        // Categories
        .route("/categories", get(categories::list_categories).post(categories::create_category))
        // Assets
        .route("/assets", get(assets::filter_assets).post(assets::create_asset))
        .route("/assets/:id", get(assets::get_asset).put(assets::update_asset))
        // Users
        .route("/users", get(users::filter_users).post(users::create_user))
        .route("/users/:id", get(users::get_user).put(users::update_user))
        .route("/users/:id/disable", post(users::disable_user))
        // Assignments
        .route(
            "/assignments",
            get(assignments::filter_assignments).post(assignments::create_assignment),
        )
        .route("/assignments/mine", get(assignments::my_assignments))
        .route("/assignments/:id/respond", post(assignments::respond_assignment))
        // Returning requests
        .route(
            "/returning-requests",
            get(returning_requests::filter_returning_requests)
                .post(returning_requests::create_returning_request),
        )
        .route(
            "/returning-requests/:id/complete",
            post(returning_requests::complete_returning_request),
        )
        .route(
            "/returning-requests/:id/cancel",
            post(returning_requests::cancel_returning_request),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
