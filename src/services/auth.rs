//! Authentication service: login, token issuing and passwords

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{format_staff_code, ChangePassword, NewUser, User, UserClaims},
    },
    repository::UserStore,
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Authenticate by username and password, returning a JWT and the account
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        if user.is_disabled {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((token, user))
    }

    /// Current account of a token
    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn me(&self, claims: &UserClaims) -> AppResult<User> {
        super::resolve_requester(self.users.as_ref(), claims).await
    }

    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn change_password(&self, claims: &UserClaims, request: ChangePassword) -> AppResult<()> {
        let user = super::resolve_requester(self.users.as_ref(), claims).await?;

        if !verify_password(&user.password_hash, &request.current_password)? {
            return Err(AppError::BadRequest("Current password is incorrect".to_string()));
        }
        if request.current_password == request.new_password {
            return Err(AppError::BadRequest(
                "New password must differ from the current one".to_string(),
            ));
        }

        let hash = hash_password(&request.new_password)?;
        self.users.set_password(user.id, &hash).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Create the configured administrator when no account exists yet.
    ///
    /// Returns whether an account was created.
    #[tracing::instrument(skip(self, bootstrap), fields(username = ?bootstrap.admin_username))]
    pub async fn bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<bool> {
        let Some((username, password, location)) = bootstrap.admin() else {
            return Ok(false);
        };
        if self.users.count().await? > 0 {
            return Ok(false);
        }

        let sequence = self.users.next_staff_sequence().await?;
        let admin = NewUser {
            staff_code: format_staff_code(sequence),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            first_name: username.to_string(),
            last_name: String::new(),
            date_of_birth: None,
            gender: None,
            joined_date: Utc::now().date_naive(),
            location: location.to_string(),
            role: Role::Admin,
            is_password_changed: false,
        };
        self.users.create(&admin).await?;
        tracing::info!(username, location, "Bootstrap administrator created");
        Ok(true)
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.id,
            username: user.username.clone(),
            roles: user.roles.clone(),
            location: user.location.clone(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
