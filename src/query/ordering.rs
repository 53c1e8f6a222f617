//! Single-key ordering resolved from a precedence table

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::ToSchema;

/// Sort direction; query strings may spell it in any case (`desc`, `Desc`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum SortOption {
    Asc,
    Desc,
}

impl SortOption {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOption::Asc => "ASC",
            SortOption::Desc => "DESC",
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOption::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOption::Desc)
        } else {
            Err(format!("Invalid sort option: {}", s))
        }
    }
}

impl<'de> Deserialize<'de> for SortOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A sortable column of one list view.
pub trait SortColumn: Copy + std::fmt::Debug {
    /// Unique column appended after the chosen key so pages are stable.
    const TIE_BREAK: &'static str;

    /// SQL expression the column sorts on.
    fn expr(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering<C> {
    pub column: C,
    pub direction: SortOption,
}

impl<C: SortColumn> Ordering<C> {
    pub fn new(column: C, direction: SortOption) -> Self {
        Self { column, direction }
    }

    /// First entry of `table` with a direction wins; otherwise `default`.
    pub fn resolve(table: &[(C, Option<SortOption>)], default: Self) -> Self {
        table
            .iter()
            .find_map(|(column, direction)| direction.map(|direction| Self::new(*column, direction)))
            .unwrap_or(default)
    }

    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" ORDER BY ");
        qb.push(self.column.expr());
        qb.push(" ");
        qb.push(self.direction.as_sql());
        qb.push(", ");
        qb.push(C::TIE_BREAK);
        qb.push(" ASC");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Column {
        Code,
        Name,
        Date,
    }

    impl SortColumn for Column {
        const TIE_BREAK: &'static str = "x.id";

        fn expr(self) -> &'static str {
            match self {
                Column::Code => "x.code",
                Column::Name => "x.name",
                Column::Date => "x.date",
            }
        }
    }

    const DEFAULT: Ordering<Column> = Ordering {
        column: Column::Date,
        direction: SortOption::Desc,
    };

    #[test]
    fn falls_back_to_default() {
        let table = [(Column::Code, None), (Column::Name, None)];
        assert_eq!(Ordering::resolve(&table, DEFAULT), DEFAULT);
    }

    #[test]
    fn earliest_entry_wins() {
        let table = [
            (Column::Code, None),
            (Column::Name, Some(SortOption::Asc)),
            (Column::Date, Some(SortOption::Desc)),
        ];
        assert_eq!(
            Ordering::resolve(&table, DEFAULT),
            Ordering::new(Column::Name, SortOption::Asc)
        );
    }

    #[test]
    fn parses_direction_in_any_case() {
        assert_eq!("desc".parse::<SortOption>(), Ok(SortOption::Desc));
        assert_eq!("ASC".parse::<SortOption>(), Ok(SortOption::Asc));
        assert_eq!(
            serde_json::from_str::<SortOption>(r#""Desc""#).unwrap(),
            SortOption::Desc
        );
        assert!("down".parse::<SortOption>().is_err());
    }

    #[test]
    fn renders_single_key_with_tie_break() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM x");
        Ordering::new(Column::Code, SortOption::Desc).push_order_by(&mut qb);
        assert_eq!(qb.sql(), "SELECT 1 FROM x ORDER BY x.code DESC, x.id ASC");
    }
}
