//! Asset category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Prefix of the asset codes in this category (`LA` for `LA000001`)
    pub prefix: String,
}

/// Create category request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_prefix"))]
    pub prefix: String,
}

fn validate_prefix(prefix: &str) -> Result<(), validator::ValidationError> {
    let valid = (2..=4).contains(&prefix.len()) && prefix.chars().all(|c| c.is_ascii_uppercase());
    if valid {
        Ok(())
    } else {
        Err(validator::ValidationError::new("prefix")
            .with_message("Prefix must be 2 to 4 uppercase letters".into()))
    }
}
