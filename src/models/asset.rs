//! Asset model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::AssetState;
use crate::query::{Clause, Ordering, Predicate, SortColumn, SortOption};

/// Asset row from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub asset_code: String,
    pub category_id: Uuid,
    pub name: String,
    pub specification: Option<String>,
    pub installed_date: Option<NaiveDate>,
    pub state: AssetState,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Row of the asset list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetListItem {
    pub id: Uuid,
    pub asset_code: String,
    pub name: String,
    pub category: String,
    pub state: AssetState,
}

/// One past or current assignment of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetHistoryEntry {
    pub assigned_date: NaiveDate,
    pub assigned_to: String,
    pub assigned_by: String,
    pub returned_date: Option<NaiveDate>,
}

/// Asset with full details for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetails {
    pub id: Uuid,
    pub asset_code: String,
    pub name: String,
    pub category_id: Uuid,
    pub category: String,
    pub specification: Option<String>,
    pub installed_date: Option<NaiveDate>,
    pub state: AssetState,
    pub location: String,
    pub history: Vec<AssetHistoryEntry>,
}

/// Create asset request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAsset {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    pub category_id: Uuid,
    #[validate(length(max = 2000, message = "Specification is too long"))]
    pub specification: Option<String>,
    pub installed_date: Option<NaiveDate>,
    pub state: AssetState,
}

/// Fields written when an asset is created; the code is generated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAsset {
    pub category_id: Uuid,
    pub name: String,
    pub specification: Option<String>,
    pub installed_date: Option<NaiveDate>,
    pub state: AssetState,
    pub location: String,
}

/// Update asset request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAsset {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Specification is too long"))]
    pub specification: Option<String>,
    pub installed_date: Option<NaiveDate>,
    pub state: AssetState,
}

/// `LA` + 6-digit sequence
pub fn format_asset_code(prefix: &str, sequence: i64) -> String {
    format!("{}{:06}", prefix, sequence)
}

/// Asset list filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssetFilterRequest {
    /// Matches asset name or code
    pub search: Option<String>,
    #[serde(default)]
    pub states: Vec<AssetState>,
    #[serde(default)]
    pub categories: Vec<Uuid>,
    pub sort_asset_code: Option<SortOption>,
    pub sort_asset_name: Option<SortOption>,
    pub sort_category: Option<SortOption>,
    pub sort_state: Option<SortOption>,
    pub sort_last_update: Option<SortOption>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSortColumn {
    AssetCode,
    AssetName,
    Category,
    State,
    LastUpdate,
}

impl SortColumn for AssetSortColumn {
    const TIE_BREAK: &'static str = "s.id";

    fn expr(self) -> &'static str {
        match self {
            AssetSortColumn::AssetCode => "s.asset_code",
            AssetSortColumn::AssetName => "s.name",
            AssetSortColumn::Category => "c.name",
            AssetSortColumn::State => "s.state",
            AssetSortColumn::LastUpdate => "s.last_updated",
        }
    }
}

const ASSET_SEARCH_FIELDS: &[&str] = &["s.name", "s.asset_code"];

impl AssetFilterRequest {
    pub fn specification(&self, location: &str) -> Predicate {
        Predicate::always()
            .and(Clause::Equals {
                expr: "s.location",
                value: location.to_string(),
            })
            .and_search(ASSET_SEARCH_FIELDS, self.search.as_deref())
            .and_any_of("s.state", &self.states)
            .and_id_in("s.category_id", &self.categories)
    }

    pub fn ordering(&self) -> Ordering<AssetSortColumn> {
        Ordering::resolve(
            &[
                (AssetSortColumn::AssetCode, self.sort_asset_code),
                (AssetSortColumn::AssetName, self.sort_asset_name),
                (AssetSortColumn::Category, self.sort_category),
                (AssetSortColumn::State, self.sort_state),
                (AssetSortColumn::LastUpdate, self.sort_last_update),
            ],
            Ordering::new(AssetSortColumn::AssetCode, SortOption::Asc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_codes_are_zero_padded() {
        assert_eq!(format_asset_code("LA", 1), "LA000001");
        assert_eq!(format_asset_code("MO", 123456), "MO123456");
    }

    #[test]
    fn filter_is_scoped_to_location() {
        let request = AssetFilterRequest::default();
        assert_eq!(
            request.specification("HN").clauses(),
            &[Clause::Equals {
                expr: "s.location",
                value: "HN".to_string()
            }]
        );
    }

    #[test]
    fn category_filter_binds_uuids() {
        let id = Uuid::nil();
        let request = AssetFilterRequest {
            categories: vec![id],
            ..Default::default()
        };
        let predicate = request.specification("HN");
        assert_eq!(
            predicate.clauses().last(),
            Some(&Clause::IdIn {
                expr: "s.category_id",
                ids: vec![id]
            })
        );
    }

    #[test]
    fn default_order_is_code_ascending() {
        assert_eq!(
            AssetFilterRequest::default().ordering(),
            Ordering::new(AssetSortColumn::AssetCode, SortOption::Asc)
        );
    }

    #[test]
    fn name_sort_outranks_state_sort() {
        let request = AssetFilterRequest {
            sort_state: Some(SortOption::Asc),
            sort_asset_name: Some(SortOption::Desc),
            ..Default::default()
        };
        assert_eq!(
            request.ordering(),
            Ordering::new(AssetSortColumn::AssetName, SortOption::Desc)
        );
    }
}
