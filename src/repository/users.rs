//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{NewUser, UpdateUser, User, UserListItem, UserSortColumn},
    },
    query::{escape_like, ListQuery, Page},
};

const USER_SELECT: &str = r#"
    SELECT u.id, u.staff_code, u.username, u.password_hash, u.first_name, u.last_name,
           u.date_of_birth, u.gender, u.joined_date, u.location, u.is_disabled,
           u.is_password_changed, u.created_at, u.last_updated,
           ARRAY(SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id
                 WHERE ur.user_id = u.id ORDER BY r.name) AS roles
    FROM users u
"#;

const LIST_PROJECTION: &str = "u.id, u.staff_code, u.first_name || ' ' || u.last_name AS full_name, \
     u.username, u.joined_date, \
     ARRAY(SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
           WHERE ur.user_id = u.id ORDER BY r.name) AS types";
const LIST_FROM: &str = "FROM users u";

/// LIKE pattern for usernames starting with `base`, taken literally.
fn username_prefix_pattern(base: &str) -> String {
    format!("{}%", escape_like(base))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self, query: &ListQuery<UserSortColumn>) -> AppResult<Page<UserListItem>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Case-insensitive lookup used by login
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn count(&self) -> AppResult<i64>;

    /// Next value of the staff code sequence
    async fn next_staff_sequence(&self) -> AppResult<i64>;

    /// Existing usernames starting with `base`
    async fn usernames_with_base(&self, base: &str) -> AppResult<Vec<String>>;

    async fn create(&self, user: &NewUser) -> AppResult<User>;

    async fn update(&self, id: Uuid, user: &UpdateUser) -> AppResult<User>;

    /// Set the disabled flag; disabling twice is a no-op.
    async fn disable(&self, id: Uuid) -> AppResult<()>;

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
}

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn replace_role(tx: &mut Transaction<'_, Postgres>, id: Uuid, role: Role) -> AppResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) SELECT $1, id FROM roles WHERE name = $2")
            .bind(id)
            .bind(role)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn list(&self, query: &ListQuery<UserSortColumn>) -> AppResult<Page<UserListItem>> {
        super::fetch_page(&self.pool, query, LIST_PROJECTION, LIST_FROM).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "{} WHERE LOWER(u.username) = LOWER($1)",
            USER_SELECT
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn next_staff_sequence(&self) -> AppResult<i64> {
        let next: i64 = sqlx::query_scalar("SELECT nextval('staff_code_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(next)
    }

    async fn usernames_with_base(&self, base: &str) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT username FROM users WHERE username LIKE $1")
            .bind(username_prefix_pattern(base))
            .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, staff_code, username, password_hash, first_name, last_name,
                               date_of_birth, gender, joined_date, location, is_disabled,
                               is_password_changed, created_at, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, FALSE, $11, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&user.staff_code)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.date_of_birth)
        .bind(user.gender)
        .bind(user.joined_date)
        .bind(&user.location)
        .bind(user.is_password_changed)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Staff code or username already exists"))?;

        Self::replace_role(&mut tx, id, user.role).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn update(&self, id: Uuid, user: &UpdateUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET date_of_birth = $2, gender = $3, joined_date = $4, last_updated = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(user.date_of_birth)
        .bind(user.gender)
        .bind(user.joined_date)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Self::replace_role(&mut tx, id, user.role).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn disable(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET is_disabled = TRUE, last_updated = NOW() WHERE id = $1 AND is_disabled = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, is_password_changed = TRUE, last_updated = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_prefix_matches_metacharacters_literally() {
        assert_eq!(username_prefix_pattern("binhnv"), "binhnv%");
        assert_eq!(username_prefix_pattern("binh(nv"), "binh(nv%");
        assert_eq!(username_prefix_pattern("an_b%"), "an\\_b\\%%");
    }
}
