//! Asset endpoints

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::asset::{Asset, AssetDetails, AssetFilterRequest, AssetListItem, CreateAsset, UpdateAsset},
};

use super::{
    extract::{AppJson, AppPath, AppQuery},
    AuthenticatedUser, BaseResult, Paged,
};

/// Filter assets of the admin's location
#[utoipa::path(
    get,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(AssetFilterRequest),
    responses(
        (status = 200, description = "Page of assets; metadata in X-Pagination", body = Vec<AssetListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn filter_assets(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppQuery(request): AppQuery<AssetFilterRequest>,
) -> AppResult<Paged<AssetListItem>> {
    claims.require_admin()?;
    let page = state.services.assets.filter(&claims, &request).await?;
    Ok(Paged(page))
}

/// Get asset details with assignment history
#[utoipa::path(
    get,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Asset details", body = AssetDetails),
        (status = 404, description = "Asset not found in this location")
    )
)]
pub async fn get_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<BaseResult<AssetDetails>>> {
    claims.require_admin()?;
    let asset = state.services.assets.get(&claims, id).await?;
    Ok(Json(BaseResult::ok(asset)))
}

/// Create an asset in the admin's location
#[utoipa::path(
    post,
    path = "/assets",
    tag = "assets",
    security(("bearer_auth" = [])),
    request_body = CreateAsset,
    responses(
        (status = 201, description = "Asset created"),
        (status = 400, description = "Invalid asset"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn create_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(asset): AppJson<CreateAsset>,
) -> AppResult<(StatusCode, Json<BaseResult<Uuid>>)> {
    claims.require_admin()?;
    let asset: Asset = state.services.assets.create(&claims, asset).await?;
    Ok((StatusCode::CREATED, Json(BaseResult::ok(asset.id))))
}

/// Update an asset
#[utoipa::path(
    put,
    path = "/assets/{id}",
    tag = "assets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    request_body = UpdateAsset,
    responses(
        (status = 200, description = "Asset updated (result is null)"),
        (status = 400, description = "Asset is assigned or request invalid"),
        (status = 404, description = "Asset not found in this location")
    )
)]
pub async fn update_asset(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(asset): AppJson<UpdateAsset>,
) -> AppResult<Json<BaseResult<()>>> {
    claims.require_admin()?;
    state.services.assets.update(&claims, id, asset).await?;
    Ok(Json(BaseResult::empty()))
}
