//! Returning request endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::returning_request::{
        CreateReturningRequest, ReturningRequestFilterRequest, ReturningRequestListItem,
    },
};

use super::{
    extract::{AppJson, AppPath, AppQuery},
    AuthenticatedUser, BaseResult, Paged,
};

/// Filter returning requests of the admin's location
#[utoipa::path(
    get,
    path = "/returning-requests",
    tag = "returning-requests",
    security(("bearer_auth" = [])),
    params(ReturningRequestFilterRequest),
    responses(
        (status = 200, description = "Page of requests; metadata in X-Pagination", body = Vec<ReturningRequestListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn filter_returning_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(request): AppQuery<ReturningRequestFilterRequest>,
) -> AppResult<Paged<ReturningRequestListItem>> {
    claims.require_admin()?;
    let page = state
        .services
        .returning_requests
        .filter(&claims, &request)
        .await?;
    Ok(Paged(page))
}

/// Request the return of an accepted assignment
#[utoipa::path(
    post,
    path = "/returning-requests",
    tag = "returning-requests",
    security(("bearer_auth" = [])),
    request_body = CreateReturningRequest,
    responses(
        (status = 201, description = "Request created, result is its id"),
        (status = 400, description = "Assignment is not accepted"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn create_returning_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(request): AppJson<CreateReturningRequest>,
) -> AppResult<(StatusCode, Json<BaseResult<Uuid>>)> {
    let id = state
        .services
        .returning_requests
        .create(&claims, request.assignment_id)
        .await?;
    Ok((StatusCode::CREATED, Json(BaseResult::ok(id))))
}

/// Confirm the asset was returned
#[utoipa::path(
    post,
    path = "/returning-requests/{id}/complete",
    tag = "returning-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Returning request ID")
    ),
    responses(
        (status = 200, description = "Request completed"),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Request not found in this location")
    )
)]
pub async fn complete_returning_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BaseResult<()>>> {
    claims.require_admin()?;
    state.services.returning_requests.complete(&claims, id).await?;
    Ok(Json(BaseResult::empty()))
}

/// Cancel a pending request
#[utoipa::path(
    post,
    path = "/returning-requests/{id}/cancel",
    tag = "returning-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Returning request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled"),
        (status = 400, description = "Request is not pending"),
        (status = 404, description = "Request not found in this location")
    )
)]
pub async fn cancel_returning_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BaseResult<()>>> {
    claims.require_admin()?;
    state.services.returning_requests.cancel(&claims, id).await?;
    Ok(Json(BaseResult::empty()))
}
