//! Business logic services

pub mod assets;
pub mod assignments;
pub mod auth;
pub mod categories;
pub mod returning_requests;
pub mod users;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::{Repository, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub categories: categories::CategoriesService,
    pub assets: assets::AssetsService,
    pub users: users::UsersService,
    pub assignments: assignments::AssignmentsService,
    pub returning_requests: returning_requests::ReturningRequestsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.users.clone(), auth_config),
            categories: categories::CategoriesService::new(
                repository.categories.clone(),
                repository.users.clone(),
            ),
            assets: assets::AssetsService::new(
                repository.assets.clone(),
                repository.categories.clone(),
                repository.users.clone(),
            ),
            users: users::UsersService::new(repository.users.clone()),
            assignments: assignments::AssignmentsService::new(
                repository.assignments.clone(),
                repository.assets.clone(),
                repository.users.clone(),
            ),
            returning_requests: returning_requests::ReturningRequestsService::new(
                repository.returning_requests.clone(),
                repository.assignments,
                repository.users,
            ),
        }
    }
}

/// Load the account behind a token.
///
/// Tokens outlive account changes, so every service call re-reads the user:
/// a deleted or disabled account is rejected before any query runs.
pub(crate) async fn resolve_requester(users: &dyn UserStore, claims: &UserClaims) -> AppResult<User> {
    let user = users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

    if user.is_disabled {
        return Err(AppError::Authentication("Account is disabled".to_string()));
    }
    Ok(user)
}

/// [`resolve_requester`] plus the admin role check
pub(crate) async fn resolve_admin(users: &dyn UserStore, claims: &UserClaims) -> AppResult<User> {
    let user = resolve_requester(users, claims).await?;
    if !user.is_admin() {
        return Err(AppError::Authorization("Admin rights required".to_string()));
    }
    Ok(user)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use crate::models::{
        enums::Role,
        user::{User, UserClaims},
    };

    pub fn user(role: Role, location: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            staff_code: "SD0001".to_string(),
            username: "binhnv".to_string(),
            password_hash: String::new(),
            first_name: "Binh".to_string(),
            last_name: "Nguyen Van".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 5),
            gender: None,
            joined_date: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
            location: location.to_string(),
            is_disabled: false,
            is_password_changed: true,
            roles: vec![role],
            created_at: now,
            last_updated: now,
        }
    }

    pub fn claims_for(user: &User) -> UserClaims {
        UserClaims {
            sub: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            location: user.location.clone(),
            exp: 0,
            iat: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::enums::Role, repository::users::MockUserStore};
    use test_support::{claims_for, user};

    #[tokio::test]
    async fn disabled_requester_is_unauthenticated() {
        let mut account = user(Role::Admin, "HCM");
        account.is_disabled = true;
        let claims = claims_for(&account);

        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(account.clone())));

        let err = resolve_requester(&users, &claims).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn unknown_requester_is_unauthenticated() {
        let claims = claims_for(&user(Role::Staff, "HCM"));
        let mut users = MockUserStore::new();
        users.expect_find_by_id().returning(|_| Ok(None));

        let err = resolve_requester(&users, &claims).await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn staff_requester_is_not_admin() {
        let account = user(Role::Staff, "HCM");
        let claims = claims_for(&account);
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(account.clone())));

        let err = resolve_admin(&users, &claims).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }
}
