//! Category endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::category::{Category, CreateCategory},
};

use super::{
    extract::AppJson,
    AuthenticatedUser, BaseResult,
};

/// List all categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<Category>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BaseResult<Vec<Category>>>> {
    claims.require_admin()?;
    let categories = state.services.categories.list(&claims).await?;
    Ok(Json(BaseResult::ok(categories)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid name or prefix"),
        (status = 409, description = "Name or prefix already used")
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(category): AppJson<CreateCategory>,
) -> AppResult<(StatusCode, Json<BaseResult<Category>>)> {
    claims.require_admin()?;
    let category = state.services.categories.create(&claims, category).await?;
    Ok((StatusCode::CREATED, Json(BaseResult::ok(category))))
}
