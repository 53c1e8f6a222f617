//! User model and related types

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::{Gender, Role};
use crate::{
    error::AppError,
    query::{Clause, Ordering, Predicate, SortColumn, SortOption},
};

/// Minimum age on the joined date
pub const MINIMUM_AGE: i32 = 18;

/// Full user model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub staff_code: String,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub joined_date: NaiveDate,
    pub location: String,
    pub is_disabled: bool,
    pub is_password_changed: bool,
    #[sqlx(default)]
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Row of the user list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: Uuid,
    pub staff_code: String,
    pub full_name: String,
    pub username: String,
    pub joined_date: NaiveDate,
    pub types: Vec<Role>,
}

/// User details for display and edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub id: Uuid,
    pub staff_code: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub joined_date: NaiveDate,
    pub location: String,
    pub types: Vec<Role>,
}

impl From<User> for UserDetails {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            staff_code: user.staff_code,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            joined_date: user.joined_date,
            location: user.location,
            types: user.roles,
        }
    }
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
    pub joined_date: NaiveDate,
    #[serde(rename = "type")]
    pub role: Role,
}

/// Fields written when a user is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub staff_code: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub joined_date: NaiveDate,
    pub location: String,
    pub role: Role,
    /// Set for accounts whose password was chosen by their owner
    pub is_password_changed: bool,
}

/// Update user request (admin)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub date_of_birth: NaiveDate,
    pub gender: Option<Gender>,
    pub joined_date: NaiveDate,
    #[serde(rename = "type")]
    pub role: Role,
}

/// Change own password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Checks the date rules shared by user creation and edition.
pub fn validate_user_dates(date_of_birth: NaiveDate, joined_date: NaiveDate) -> Result<(), AppError> {
    if joined_date <= date_of_birth {
        return Err(AppError::Validation(
            "Joined date must be later than date of birth".to_string(),
        ));
    }
    if years_between(date_of_birth, joined_date) < MINIMUM_AGE {
        return Err(AppError::Validation(format!(
            "User must be at least {} years old on the joined date",
            MINIMUM_AGE
        )));
    }
    if matches!(joined_date.weekday(), Weekday::Sat | Weekday::Sun) {
        return Err(AppError::Validation(
            "Joined date cannot be Saturday or Sunday".to_string(),
        ));
    }
    Ok(())
}

fn years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

/// `SD` + 4-digit sequence
pub fn format_staff_code(sequence: i64) -> String {
    format!("SD{:04}", sequence)
}

/// First name followed by the initials of every last-name word, lowercased
/// and stripped of whitespace: `Nguyen Van` + `Binh` gives `binhnv`.
pub fn base_username(first_name: &str, last_name: &str) -> String {
    let first: String = first_name
        .split_whitespace()
        .collect::<String>()
        .to_lowercase();
    let initials: String = last_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_lowercase();
    format!("{}{}", first, initials)
}

/// `base` if free, otherwise `base` followed by the next unused number.
/// `taken` holds the usernames already starting with `base`; only an exact
/// match or `base` plus digits counts as a collision.
pub fn next_username(base: &str, taken: &[String]) -> String {
    let mut highest: Option<u32> = None;
    for name in taken {
        let Some(suffix) = name.strip_prefix(base) else {
            continue;
        };
        if suffix.is_empty() {
            highest = highest.max(Some(0));
        } else if suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = suffix.parse::<u32>() {
                highest = highest.max(Some(n));
            }
        }
    }
    match highest {
        None => base.to_string(),
        Some(n) => format!("{}{}", base, n + 1),
    }
}

/// Initial password: `username@ddMMyyyy` of the date of birth
pub fn default_password(username: &str, date_of_birth: NaiveDate) -> String {
    format!("{}@{}", username, date_of_birth.format("%d%m%Y"))
}

/// User list filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilterRequest {
    /// Matches full name, staff code or username
    pub search: Option<String>,
    #[serde(default)]
    pub types: Vec<Role>,
    pub sort_staff_code: Option<SortOption>,
    pub sort_full_name: Option<SortOption>,
    pub sort_joined_date: Option<SortOption>,
    pub sort_type: Option<SortOption>,
    pub sort_last_update: Option<SortOption>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortColumn {
    StaffCode,
    FullName,
    JoinedDate,
    Type,
    LastUpdate,
}

/// Name of the first role of `u`, used for the type filter and sort.
pub const PRIMARY_ROLE_EXPR: &str = "(SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
     WHERE ur.user_id = u.id ORDER BY r.name LIMIT 1)";

impl SortColumn for UserSortColumn {
    const TIE_BREAK: &'static str = "u.id";

    fn expr(self) -> &'static str {
        match self {
            UserSortColumn::StaffCode => "u.staff_code",
            UserSortColumn::FullName => "u.first_name || ' ' || u.last_name",
            UserSortColumn::JoinedDate => "u.joined_date",
            UserSortColumn::Type => PRIMARY_ROLE_EXPR,
            UserSortColumn::LastUpdate => "u.last_updated",
        }
    }
}

const USER_SEARCH_FIELDS: &[&str] = &["u.first_name || ' ' || u.last_name", "u.staff_code", "u.username"];

impl UserFilterRequest {
    pub fn specification(&self, location: &str) -> Predicate {
        Predicate::always()
            .and(Clause::Equals {
                expr: "u.location",
                value: location.to_string(),
            })
            .and(Clause::IsFalse {
                expr: "u.is_disabled",
            })
            .and_search(USER_SEARCH_FIELDS, self.search.as_deref())
            .and_any_of(PRIMARY_ROLE_EXPR, &self.types)
    }

    pub fn ordering(&self) -> Ordering<UserSortColumn> {
        Ordering::resolve(
            &[
                (UserSortColumn::StaffCode, self.sort_staff_code),
                (UserSortColumn::FullName, self.sort_full_name),
                (UserSortColumn::JoinedDate, self.sort_joined_date),
                (UserSortColumn::Type, self.sort_type),
                (UserSortColumn::LastUpdate, self.sort_last_update),
            ],
            Ordering::new(UserSortColumn::JoinedDate, SortOption::Desc),
        )
    }
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    pub roles: Vec<Role>,
    pub location: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
