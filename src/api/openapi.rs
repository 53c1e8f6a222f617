//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assets, assignments, auth, categories, health, returning_requests, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Asset Management API",
        version = "1.0.0",
        description = "IT asset management REST API. Every body is wrapped in \
                       `{ isSuccess, error, result }`; list endpoints return pagination \
                       metadata in the `X-Pagination` header."
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Categories
        categories::list_categories,
        categories::create_category,
        // Assets
        assets::filter_assets,
        assets::get_asset,
        assets::create_asset,
        assets::update_asset,
        // Users
        users::filter_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::disable_user,
        // Assignments
        assignments::filter_assignments,
        assignments::create_assignment,
        assignments::my_assignments,
        assignments::respond_assignment,
        // Returning requests
        returning_requests::filter_returning_requests,
        returning_requests::create_returning_request,
        returning_requests::complete_returning_request,
        returning_requests::cancel_returning_request,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::ChangePassword,
            // Categories
            crate::models::category::Category,
            crate::models::category::CreateCategory,
            // Assets
            crate::models::asset::AssetListItem,
            crate::models::asset::AssetDetails,
            crate::models::asset::AssetHistoryEntry,
            crate::models::asset::CreateAsset,
            crate::models::asset::UpdateAsset,
            // Users
            crate::models::user::UserListItem,
            crate::models::user::UserDetails,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Assignments
            crate::models::assignment::AssignmentListItem,
            crate::models::assignment::MyAssignmentItem,
            crate::models::assignment::CreateAssignment,
            crate::models::assignment::RespondAssignment,
            // Returning requests
            crate::models::returning_request::ReturningRequestListItem,
            crate::models::returning_request::CreateReturningRequest,
            // Shared
            crate::models::enums::AssetState,
            crate::models::enums::AssignmentState,
            crate::models::enums::ReturningRequestState,
            crate::models::enums::Role,
            crate::models::enums::Gender,
            crate::query::SortOption,
            crate::query::PaginationMetadata,
            health::HealthResponse,
            crate::error::ErrorInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "categories", description = "Asset categories"),
        (name = "assets", description = "Asset management"),
        (name = "users", description = "User management"),
        (name = "assignments", description = "Asset assignments"),
        (name = "returning-requests", description = "Requests for returning assets")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
