//! User management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{
        base_username, default_password, format_staff_code, next_username, validate_user_dates,
        CreateUser, NewUser, UpdateUser, User, UserClaims, UserDetails, UserFilterRequest,
        UserListItem,
    },
    query::{ListQuery, Page, Paging},
    repository::UserStore,
};

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserStore>,
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with id {} not found", id))
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Load a user of the admin's location
    async fn get_in_location(&self, admin: &User, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .filter(|user| user.location == admin.location)
            .ok_or_else(|| user_not_found(id))
    }

    /// Active users of the admin's location matching the filter
    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn filter(
        &self,
        claims: &UserClaims,
        request: &UserFilterRequest,
    ) -> AppResult<Page<UserListItem>> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let query = ListQuery::new(
            request.specification(&admin.location),
            request.ordering(),
            Paging::from_request(request.page_number, request.page_size),
        );
        self.users.list(&query).await
    }

    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn get(&self, claims: &UserClaims, id: Uuid) -> AppResult<UserDetails> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        Ok(self.get_in_location(&admin, id).await?.into())
    }

    #[tracing::instrument(skip(self, claims, user), fields(user_id = %claims.sub))]
    pub async fn create(&self, claims: &UserClaims, user: CreateUser) -> AppResult<UserDetails> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        user.validate()?;
        validate_user_dates(user.date_of_birth, user.joined_date)?;

        let base = base_username(&user.first_name, &user.last_name);
        if base.is_empty() {
            return Err(AppError::Validation("Name must contain letters".to_string()));
        }
        let username = next_username(&base, &self.users.usernames_with_base(&base).await?);
        let staff_code = format_staff_code(self.users.next_staff_sequence().await?);
        let password_hash =
            super::auth::hash_password(&default_password(&username, user.date_of_birth))?;

        let created = self
            .users
            .create(&NewUser {
                staff_code,
                username,
                password_hash,
                first_name: user.first_name,
                last_name: user.last_name,
                date_of_birth: Some(user.date_of_birth),
                gender: user.gender,
                joined_date: user.joined_date,
                location: admin.location,
                role: user.role,
                is_password_changed: false,
            })
            .await?;
        tracing::info!(
            created_id = %created.id,
            staff_code = %created.staff_code,
            username = %created.username,
            "User created"
        );
        Ok(created.into())
    }

    #[tracing::instrument(skip(self, claims, user), fields(user_id = %claims.sub))]
    pub async fn update(&self, claims: &UserClaims, id: Uuid, user: UpdateUser) -> AppResult<UserDetails> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let existing = self.get_in_location(&admin, id).await?;
        if existing.is_disabled {
            return Err(user_not_found(id));
        }
        validate_user_dates(user.date_of_birth, user.joined_date)?;

        let updated = self.users.update(id, &user).await?;
        tracing::info!(updated_id = %id, "User updated");
        Ok(updated.into())
    }

    /// Disable an account; disabling a disabled account succeeds unchanged.
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn disable(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        if admin.id == id {
            return Err(AppError::BadRequest("You cannot disable your own account".to_string()));
        }

        let target = self.get_in_location(&admin, id).await?;
        if target.is_disabled {
            return Ok(());
        }

        self.users.disable(id).await?;
        tracing::info!(disabled_id = %id, "User disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    use crate::{
        models::{
            enums::{Gender, Role},
            user::UserSortColumn,
        },
        query::{Ordering, SortOption},
        repository::users::MockUserStore,
        services::test_support::{claims_for, user},
    };

    /// Store answering `find_by_id` from a fixed set of accounts
    fn store_with(accounts: Vec<User>) -> MockUserStore {
        let mut users = MockUserStore::new();
        users.expect_find_by_id().returning(move |id| {
            Ok(accounts.iter().find(|account| account.id == id).cloned())
        });
        users
    }

    #[tokio::test]
    async fn staff_code_sort_outranks_joined_date_sort() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let mut users = store_with(vec![admin]);
        users
            .expect_list()
            .withf(|query| {
                query.ordering == Ordering::new(UserSortColumn::StaffCode, SortOption::Asc)
            })
            .returning(|query| Ok(Page::new(Vec::new(), query.paging, 0)));

        let service = UsersService::new(Arc::new(users));
        let request = UserFilterRequest {
            sort_staff_code: Some(SortOption::Asc),
            sort_joined_date: Some(SortOption::Desc),
            ..Default::default()
        };
        service.filter(&claims, &request).await.unwrap();
    }

    #[tokio::test]
    async fn disabling_twice_is_idempotent() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let mut target = user(Role::Staff, "HCM");
        target.is_disabled = true;
        let target_id = target.id;

        let mut users = store_with(vec![admin, target]);
        users.expect_disable().never();

        let service = UsersService::new(Arc::new(users));
        service.disable(&claims, target_id).await.unwrap();
        service.disable(&claims, target_id).await.unwrap();
    }

    #[tokio::test]
    async fn disable_writes_once_for_active_user() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let target = user(Role::Staff, "HCM");
        let target_id = target.id;

        let mut users = store_with(vec![admin, target]);
        users
            .expect_disable()
            .with(eq(target_id))
            .times(1)
            .returning(|_| Ok(()));

        let service = UsersService::new(Arc::new(users));
        service.disable(&claims, target_id).await.unwrap();
    }

    #[tokio::test]
    async fn user_of_other_location_is_not_found() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let target = user(Role::Staff, "HN");
        let target_id = target.id;

        let users = store_with(vec![admin, target]);
        let service = UsersService::new(Arc::new(users));
        let err = service.disable(&claims, target_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_generates_code_username_and_location() {
        let admin = user(Role::Admin, "DN");
        let claims = claims_for(&admin);
        let mut users = store_with(vec![admin]);
        users
            .expect_usernames_with_base()
            .withf(|base| base == "binhnv")
            .returning(|_| Ok(vec!["binhnv".to_string(), "binhnv1".to_string()]));
        users.expect_next_staff_sequence().returning(|| Ok(42));
        users
            .expect_create()
            .withf(|new| {
                new.staff_code == "SD0042"
                    && new.username == "binhnv2"
                    && new.location == "DN"
                    && !new.is_password_changed
            })
            .returning(|new| {
                let mut created = user(new.role, &new.location);
                created.staff_code = new.staff_code.clone();
                created.username = new.username.clone();
                Ok(created)
            });

        let service = UsersService::new(Arc::new(users));
        let request = CreateUser {
            first_name: "Binh".to_string(),
            last_name: "Nguyen Van".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1999, 1, 5).unwrap(),
            gender: Some(Gender::Male),
            joined_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            role: Role::Staff,
        };
        let created = service.create(&claims, request).await.unwrap();
        assert_eq!(created.staff_code, "SD0042");
        assert_eq!(created.username, "binhnv2");
    }

    #[tokio::test]
    async fn create_handles_metacharacters_in_first_name() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let mut users = store_with(vec![admin]);
        users
            .expect_usernames_with_base()
            .withf(|base| base == "binh(nv")
            .returning(|_| Ok(vec!["binh(nv".to_string()]));
        users.expect_next_staff_sequence().returning(|| Ok(7));
        users
            .expect_create()
            .withf(|new| new.username == "binh(nv1")
            .returning(|new| {
                let mut created = user(new.role, &new.location);
                created.username = new.username.clone();
                Ok(created)
            });

        let service = UsersService::new(Arc::new(users));
        let request = CreateUser {
            first_name: "Binh(".to_string(),
            last_name: "Nguyen Van".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1999, 1, 5).unwrap(),
            gender: None,
            joined_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            role: Role::Staff,
        };
        let created = service.create(&claims, request).await.unwrap();
        assert_eq!(created.username, "binh(nv1");
    }

    #[tokio::test]
    async fn create_rejects_underage_user() {
        let admin = user(Role::Admin, "DN");
        let claims = claims_for(&admin);
        let mut users = store_with(vec![admin]);
        users.expect_create().never();

        let service = UsersService::new(Arc::new(users));
        let request = CreateUser {
            first_name: "An".to_string(),
            last_name: "Tran".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2010, 1, 5).unwrap(),
            gender: None,
            joined_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            role: Role::Staff,
        };
        let err = service.create(&claims, request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn get_hides_users_of_other_locations() {
        let admin = user(Role::Admin, "HCM");
        let claims = claims_for(&admin);
        let elsewhere = user(Role::Staff, "HN");
        let elsewhere_id = elsewhere.id;

        let service = UsersService::new(Arc::new(store_with(vec![admin, elsewhere])));
        let err = service.get(&claims, elsewhere_id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
