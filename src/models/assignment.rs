//! Assignment (asset checked out to a user) model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::AssignmentState;
use crate::query::{Clause, Ordering, Predicate, SortColumn, SortOption};

/// Assignment row with the locations its guards need
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub assigned_by_id: Uuid,
    pub assigned_to_id: Uuid,
    pub note: Option<String>,
    pub assigned_date: NaiveDate,
    pub state: AssignmentState,
    pub last_updated: DateTime<Utc>,
    /// Location of the assigned asset
    pub asset_location: String,
    /// Location of the admin who made the assignment
    pub assigned_by_location: String,
}

/// Row of the admin assignment list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentListItem {
    pub id: Uuid,
    pub asset_code: String,
    pub asset_name: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub assigned_date: NaiveDate,
    pub state: AssignmentState,
}

/// Row of the assignee's own assignment list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyAssignmentItem {
    pub id: Uuid,
    pub asset_code: String,
    pub asset_name: String,
    pub category: String,
    pub assigned_date: NaiveDate,
    pub state: AssignmentState,
}

/// Create assignment request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    /// User the asset is assigned to
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub assigned_date: NaiveDate,
    #[validate(length(max = 600, message = "Note is too long"))]
    pub note: Option<String>,
}

/// Fields written when an assignment is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub asset_id: Uuid,
    pub assigned_by_id: Uuid,
    pub assigned_to_id: Uuid,
    pub note: Option<String>,
    pub assigned_date: NaiveDate,
}

/// Assignee's answer to a pending assignment
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondAssignment {
    pub accept: bool,
}

/// Admin assignment list filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterRequest {
    /// Matches asset name, asset code or assignee username
    pub search: Option<String>,
    #[serde(default)]
    pub states: Vec<AssignmentState>,
    pub assigned_date: Option<NaiveDate>,
    pub sort_asset_code: Option<SortOption>,
    pub sort_asset_name: Option<SortOption>,
    pub sort_assigned_to: Option<SortOption>,
    pub sort_assigned_by: Option<SortOption>,
    pub sort_assigned_date: Option<SortOption>,
    pub sort_state: Option<SortOption>,
    pub sort_last_update: Option<SortOption>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentSortColumn {
    AssetCode,
    AssetName,
    AssignedTo,
    AssignedBy,
    AssignedDate,
    State,
    LastUpdate,
}

impl SortColumn for AssignmentSortColumn {
    const TIE_BREAK: &'static str = "a.id";

    fn expr(self) -> &'static str {
        match self {
            AssignmentSortColumn::AssetCode => "s.asset_code",
            AssignmentSortColumn::AssetName => "s.name",
            AssignmentSortColumn::AssignedTo => "ato.username",
            AssignmentSortColumn::AssignedBy => "aby.username",
            AssignmentSortColumn::AssignedDate => "a.assigned_date",
            AssignmentSortColumn::State => "a.state",
            AssignmentSortColumn::LastUpdate => "a.last_updated",
        }
    }
}

const ASSIGNMENT_SEARCH_FIELDS: &[&str] = &["s.name", "s.asset_code", "ato.username"];

impl AssignmentFilterRequest {
    pub fn specification(&self, location: &str) -> Predicate {
        Predicate::always()
            .and(Clause::Equals {
                expr: "s.location",
                value: location.to_string(),
            })
            .and_search(ASSIGNMENT_SEARCH_FIELDS, self.search.as_deref())
            .and_any_of("a.state", &self.states)
            .and_on_date("a.assigned_date", self.assigned_date)
    }

    pub fn ordering(&self) -> Ordering<AssignmentSortColumn> {
        Ordering::resolve(
            &[
                (AssignmentSortColumn::AssetCode, self.sort_asset_code),
                (AssignmentSortColumn::AssetName, self.sort_asset_name),
                (AssignmentSortColumn::AssignedTo, self.sort_assigned_to),
                (AssignmentSortColumn::AssignedBy, self.sort_assigned_by),
                (AssignmentSortColumn::AssignedDate, self.sort_assigned_date),
                (AssignmentSortColumn::State, self.sort_state),
                (AssignmentSortColumn::LastUpdate, self.sort_last_update),
            ],
            Ordering::new(AssignmentSortColumn::AssignedDate, SortOption::Desc),
        )
    }
}

/// Own assignment list filter
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MyAssignmentFilterRequest {
    /// Defaults to every non-terminal state
    #[serde(default)]
    pub states: Vec<AssignmentState>,
    pub sort_asset_code: Option<SortOption>,
    pub sort_asset_name: Option<SortOption>,
    pub sort_category: Option<SortOption>,
    pub sort_assigned_date: Option<SortOption>,
    pub sort_state: Option<SortOption>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MyAssignmentSortColumn {
    AssetCode,
    AssetName,
    Category,
    AssignedDate,
    State,
}

impl SortColumn for MyAssignmentSortColumn {
    const TIE_BREAK: &'static str = "a.id";

    fn expr(self) -> &'static str {
        match self {
            MyAssignmentSortColumn::AssetCode => "s.asset_code",
            MyAssignmentSortColumn::AssetName => "s.name",
            MyAssignmentSortColumn::Category => "c.name",
            MyAssignmentSortColumn::AssignedDate => "a.assigned_date",
            MyAssignmentSortColumn::State => "a.state",
        }
    }
}

impl MyAssignmentFilterRequest {
    pub fn specification(&self, user_id: Uuid) -> Predicate {
        let states = if self.states.is_empty() {
            AssignmentState::ACTIVE
        } else {
            self.states.as_slice()
        };
        Predicate::always()
            .and(Clause::IdEquals {
                expr: "a.assigned_to_id",
                id: user_id,
            })
            .and_any_of("a.state", states)
    }

    pub fn ordering(&self) -> Ordering<MyAssignmentSortColumn> {
        Ordering::resolve(
            &[
                (MyAssignmentSortColumn::AssetCode, self.sort_asset_code),
                (MyAssignmentSortColumn::AssetName, self.sort_asset_name),
                (MyAssignmentSortColumn::Category, self.sort_category),
                (MyAssignmentSortColumn::AssignedDate, self.sort_assigned_date),
                (MyAssignmentSortColumn::State, self.sort_state),
            ],
            Ordering::new(MyAssignmentSortColumn::AssignedDate, SortOption::Desc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_filter_builds_every_clause_in_order() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();
        let request = AssignmentFilterRequest {
            search: Some("LA0".to_string()),
            states: vec![AssignmentState::Accepted, AssignmentState::WaitingForAcceptance],
            assigned_date: Some(date),
            ..Default::default()
        };

        assert_eq!(
            request.specification("HCM").clauses(),
            &[
                Clause::Equals {
                    expr: "s.location",
                    value: "HCM".to_string()
                },
                Clause::Contains {
                    exprs: ASSIGNMENT_SEARCH_FIELDS,
                    term: "LA0".to_string()
                },
                Clause::AnyOf {
                    expr: "a.state",
                    values: vec!["Accepted".to_string(), "WaitingForAcceptance".to_string()]
                },
                Clause::OnDate {
                    expr: "a.assigned_date",
                    date
                },
            ]
        );
    }

    #[test]
    fn default_order_is_most_recent_first() {
        assert_eq!(
            AssignmentFilterRequest::default().ordering(),
            Ordering::new(AssignmentSortColumn::AssignedDate, SortOption::Desc)
        );
    }

    #[test]
    fn sort_precedence_follows_column_order() {
        let request = AssignmentFilterRequest {
            sort_last_update: Some(SortOption::Desc),
            sort_assigned_by: Some(SortOption::Asc),
            sort_state: Some(SortOption::Desc),
            ..Default::default()
        };
        assert_eq!(
            request.ordering(),
            Ordering::new(AssignmentSortColumn::AssignedBy, SortOption::Asc)
        );
    }

    #[test]
    fn own_list_defaults_to_active_states() {
        let user = Uuid::new_v4();
        let predicate = MyAssignmentFilterRequest::default().specification(user);
        assert_eq!(
            predicate.clauses(),
            &[
                Clause::IdEquals {
                    expr: "a.assigned_to_id",
                    id: user
                },
                Clause::AnyOf {
                    expr: "a.state",
                    values: vec![
                        "WaitingForAcceptance".to_string(),
                        "Accepted".to_string(),
                        "WaitingForReturning".to_string()
                    ]
                },
            ]
        );
    }
}
