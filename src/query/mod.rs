//! Filtered list query pipeline.
//!
//! A list request is turned into three independent pieces which the
//! repositories render into one SQL statement pair:
//!
//! * a [`Predicate`]: conjunction of optional clauses (location scope, free
//!   text search, state membership, date equality);
//! * an [`Ordering`]: the single sort key resolved from a fixed precedence
//!   table, or the entity default;
//! * a [`Paging`] window with the `(1, 5)` fallback.
//!
//! The total count is taken over the filtered set before ordering and
//! paging; rows are projected only for the requested page.

pub mod ordering;
pub mod paging;
pub mod predicate;

use sqlx::{Postgres, QueryBuilder};

pub use ordering::{Ordering, SortColumn, SortOption};
pub use paging::{Page, Paging, PaginationMetadata};
pub use predicate::{escape_like, Clause, Predicate};

/// Everything a store needs to run one filtered list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<C> {
    pub predicate: Predicate,
    pub ordering: Ordering<C>,
    pub paging: Paging,
}

impl<C: SortColumn> ListQuery<C> {
    pub fn new(predicate: Predicate, ordering: Ordering<C>, paging: Paging) -> Self {
        Self {
            predicate,
            ordering,
            paging,
        }
    }

    /// `SELECT COUNT(*) {from} WHERE ...` over the unpaginated set.
    pub fn count_sql<'a>(&self, from: &str) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) ");
        qb.push(from);
        self.predicate.push_where(&mut qb);
        qb
    }

    /// `SELECT {projection} {from} WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn page_sql<'a>(&self, projection: &str, from: &str) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(projection);
        qb.push(" ");
        qb.push(from);
        self.predicate.push_where(&mut qb);
        self.ordering.push_order_by(&mut qb);
        self.paging.push_limit(&mut qb);
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Column {
        Name,
    }

    impl SortColumn for Column {
        const TIE_BREAK: &'static str = "t.id";

        fn expr(self) -> &'static str {
            match self {
                Column::Name => "t.name",
            }
        }
    }

    #[test]
    fn count_ignores_ordering_and_paging() {
        let query = ListQuery::new(
            Predicate::always().and(Clause::Equals {
                expr: "t.location",
                value: "HCM".to_string(),
            }),
            Ordering::new(Column::Name, SortOption::Asc),
            Paging::from_request(Some(3), Some(10)),
        );

        let qb = query.count_sql("FROM things t");
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM things t WHERE TRUE AND (t.location = $1)");
    }

    #[test]
    fn page_applies_order_then_window() {
        let query = ListQuery::new(
            Predicate::always(),
            Ordering::new(Column::Name, SortOption::Desc),
            Paging::from_request(Some(3), Some(10)),
        );

        let qb = query.page_sql("t.id, t.name", "FROM things t");
        assert_eq!(
            qb.sql(),
            "SELECT t.id, t.name FROM things t WHERE TRUE ORDER BY t.name DESC, t.id ASC LIMIT $1 OFFSET $2"
        );
    }
}
