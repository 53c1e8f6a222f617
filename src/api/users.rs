//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateUser, UserDetails, UserFilterRequest, UserListItem},
};

use super::{
    extract::{AppJson, AppPath, AppQuery},
    AuthenticatedUser, BaseResult, Paged,
};

/// Filter active users of the admin's location
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserFilterRequest),
    responses(
        (status = 200, description = "Page of users; metadata in X-Pagination", body = Vec<UserListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn filter_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(request): AppQuery<UserFilterRequest>,
) -> AppResult<Paged<UserListItem>> {
    claims.require_admin()?;
    let page = state.services.users.filter(&claims, &request).await?;
    Ok(Paged(page))
}

/// Get user details
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 404, description = "User not found in this location")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BaseResult<UserDetails>>> {
    claims.require_admin()?;
    let user = state.services.users.get(&claims, id).await?;
    Ok(Json(BaseResult::ok(user)))
}

/// Create a user in the admin's location
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserDetails),
        (status = 400, description = "Invalid user")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(user): AppJson<CreateUser>,
) -> AppResult<(StatusCode, Json<BaseResult<UserDetails>>)> {
    claims.require_admin()?;
    let user = state.services.users.create(&claims, user).await?;
    Ok((StatusCode::CREATED, Json(BaseResult::ok(user))))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserDetails),
        (status = 400, description = "Invalid dates"),
        (status = 404, description = "User not found in this location")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(user): AppJson<UpdateUser>,
) -> AppResult<Json<BaseResult<UserDetails>>> {
    claims.require_admin()?;
    let user = state.services.users.update(&claims, id, user).await?;
    Ok(Json(BaseResult::ok(user)))
}

/// Disable a user; repeating the call is harmless
#[utoipa::path(
    post,
    path = "/users/{id}/disable",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User disabled"),
        (status = 404, description = "User not found in this location")
    )
)]
pub async fn disable_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BaseResult<()>>> {
    claims.require_admin()?;
    state.services.users.disable(&claims, id).await?;
    Ok(Json(BaseResult::empty()))
}
