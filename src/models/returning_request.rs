//! Returning request model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::enums::ReturningRequestState;
use crate::query::{Clause, Ordering, Predicate, SortColumn, SortOption};

/// Returning request row with the location of its asset
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReturningRequest {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub requested_by_id: Uuid,
    pub accepted_by_id: Option<Uuid>,
    pub returned_date: Option<NaiveDate>,
    pub state: ReturningRequestState,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub asset_id: Uuid,
    pub asset_location: String,
}

/// Row of the returning request list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturningRequestListItem {
    pub id: Uuid,
    pub asset_code: String,
    pub asset_name: String,
    pub requested_by: String,
    pub assigned_date: NaiveDate,
    pub accepted_by: Option<String>,
    pub returned_date: Option<NaiveDate>,
    pub state: ReturningRequestState,
}

/// Request body for opening a returning request
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturningRequest {
    pub assignment_id: Uuid,
}

/// Returning request list filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReturningRequestFilterRequest {
    /// Matches asset code, asset name or requester username
    pub search: Option<String>,
    #[serde(default)]
    pub states: Vec<ReturningRequestState>,
    pub returned_date: Option<NaiveDate>,
    pub sort_asset_code: Option<SortOption>,
    pub sort_asset_name: Option<SortOption>,
    pub sort_requested_by: Option<SortOption>,
    pub sort_assigned_date: Option<SortOption>,
    pub sort_accepted_by: Option<SortOption>,
    pub sort_returned_date: Option<SortOption>,
    pub sort_state: Option<SortOption>,
    pub sort_last_update: Option<SortOption>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningRequestSortColumn {
    AssetCode,
    AssetName,
    RequestedBy,
    AssignedDate,
    AcceptedBy,
    ReturnedDate,
    State,
    LastUpdate,
}

impl SortColumn for ReturningRequestSortColumn {
    const TIE_BREAK: &'static str = "rr.id";

    fn expr(self) -> &'static str {
        match self {
            ReturningRequestSortColumn::AssetCode => "s.asset_code",
            ReturningRequestSortColumn::AssetName => "s.name",
            ReturningRequestSortColumn::RequestedBy => "rb.username",
            ReturningRequestSortColumn::AssignedDate => "a.assigned_date",
            ReturningRequestSortColumn::AcceptedBy => "ab.username",
            ReturningRequestSortColumn::ReturnedDate => "rr.returned_date",
            ReturningRequestSortColumn::State => "rr.state",
            ReturningRequestSortColumn::LastUpdate => "rr.last_updated",
        }
    }
}

const RETURNING_SEARCH_FIELDS: &[&str] = &["s.asset_code", "s.name", "rb.username"];

impl ReturningRequestFilterRequest {
    pub fn specification(&self, location: &str) -> Predicate {
        Predicate::always()
            .and(Clause::Equals {
                expr: "s.location",
                value: location.to_string(),
            })
            .and_search(RETURNING_SEARCH_FIELDS, self.search.as_deref())
            .and_any_of("rr.state", &self.states)
            .and_on_date("rr.returned_date", self.returned_date)
    }

    pub fn ordering(&self) -> Ordering<ReturningRequestSortColumn> {
        use ReturningRequestSortColumn::*;
        Ordering::resolve(
            &[
                (AssetCode, self.sort_asset_code),
                (AssetName, self.sort_asset_name),
                (RequestedBy, self.sort_requested_by),
                (AssignedDate, self.sort_assigned_date),
                (AcceptedBy, self.sort_accepted_by),
                (ReturnedDate, self.sort_returned_date),
                (State, self.sort_state),
                (LastUpdate, self.sort_last_update),
            ],
            Ordering::new(LastUpdate, SortOption::Desc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_and_empty_states_add_nothing() {
        let request = ReturningRequestFilterRequest {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.specification("HN").clauses().len(), 1);
    }

    #[test]
    fn returned_date_filters_on_date_part() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let request = ReturningRequestFilterRequest {
            states: vec![ReturningRequestState::Completed],
            returned_date: Some(date),
            ..Default::default()
        };
        let predicate = request.specification("HN");
        assert_eq!(
            &predicate.clauses()[1..],
            &[
                Clause::AnyOf {
                    expr: "rr.state",
                    values: vec!["Completed".to_string()]
                },
                Clause::OnDate {
                    expr: "rr.returned_date",
                    date
                },
            ]
        );
    }

    #[test]
    fn first_requested_sort_wins() {
        let request = ReturningRequestFilterRequest {
            sort_returned_date: Some(SortOption::Asc),
            sort_requested_by: Some(SortOption::Desc),
            ..Default::default()
        };
        assert_eq!(
            request.ordering(),
            Ordering::new(ReturningRequestSortColumn::RequestedBy, SortOption::Desc)
        );
        assert_eq!(
            ReturningRequestFilterRequest::default().ordering(),
            Ordering::new(ReturningRequestSortColumn::LastUpdate, SortOption::Desc)
        );
    }
}
