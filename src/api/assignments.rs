//! Assignment endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::assignment::{
        AssignmentFilterRequest, AssignmentListItem, CreateAssignment, MyAssignmentFilterRequest,
        MyAssignmentItem, RespondAssignment,
    },
};

use super::{
    extract::{AppJson, AppPath, AppQuery},
    AuthenticatedUser, BaseResult, Paged,
};

/// Filter assignments of the admin's location
#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(AssignmentFilterRequest),
    responses(
        (status = 200, description = "Page of assignments; metadata in X-Pagination", body = Vec<AssignmentListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn filter_assignments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(request): AppQuery<AssignmentFilterRequest>,
) -> AppResult<Paged<AssignmentListItem>> {
    claims.require_admin()?;
    let page = state.services.assignments.filter(&claims, &request).await?;
    Ok(Paged(page))
}

/// Assign an available asset to a user
#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    security(("bearer_auth" = [])),
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Assignment created, result is its id"),
        (status = 400, description = "Asset not available or user disabled"),
        (status = 404, description = "Asset or user not found")
    )
)]
pub async fn create_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(request): AppJson<CreateAssignment>,
) -> AppResult<(StatusCode, Json<BaseResult<Uuid>>)> {
    claims.require_admin()?;
    let id = state.services.assignments.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(BaseResult::ok(id))))
}

/// Assignments given to the current user
#[utoipa::path(
    get,
    path = "/assignments/mine",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(MyAssignmentFilterRequest),
    responses(
        (status = 200, description = "Page of own assignments; metadata in X-Pagination", body = Vec<MyAssignmentItem>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_assignments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(request): AppQuery<MyAssignmentFilterRequest>,
) -> AppResult<Paged<MyAssignmentItem>> {
    let page = state.services.assignments.list_own(&claims, &request).await?;
    Ok(Paged(page))
}

/// Accept or decline an assignment
#[utoipa::path(
    post,
    path = "/assignments/{id}/respond",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    request_body = RespondAssignment,
    responses(
        (status = 200, description = "Answer recorded"),
        (status = 400, description = "Assignment is not waiting for acceptance"),
        (status = 403, description = "Not the assignee")
    )
)]
pub async fn respond_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<RespondAssignment>,
) -> AppResult<Json<BaseResult<()>>> {
    state
        .services
        .assignments
        .respond(&claims, id, request.accept)
        .await?;
    Ok(Json(BaseResult::empty()))
}
