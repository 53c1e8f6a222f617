//! Conjunctive filter predicates rendered to SQL with bound parameters

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// One filter category. Clauses of a [`Predicate`] are ANDed; only
/// `Contains` ORs across its own expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `expr = value`
    Equals { expr: &'static str, value: String },
    /// `expr = id` on a uuid column
    IdEquals { expr: &'static str, id: Uuid },
    /// `expr = ANY(ids)` on a uuid column
    IdIn { expr: &'static str, ids: Vec<Uuid> },
    /// `expr = FALSE`
    IsFalse { expr: &'static str },
    /// Case-insensitive substring match on any of `exprs`. `term` is trimmed;
    /// both sides are lowercased by the database.
    Contains {
        exprs: &'static [&'static str],
        term: String,
    },
    /// `expr = ANY(values)`
    AnyOf {
        expr: &'static str,
        values: Vec<String>,
    },
    /// Date part of `expr` equals `date`.
    OnDate { expr: &'static str, date: NaiveDate },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// The always-true predicate.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Adds a `Contains` clause unless `search` is missing or blank.
    pub fn and_search(self, exprs: &'static [&'static str], search: Option<&str>) -> Self {
        match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => self.and(Clause::Contains {
                exprs,
                term: term.to_string(),
            }),
            None => self,
        }
    }

    /// Adds an `AnyOf` clause unless `values` is empty.
    pub fn and_any_of<T: AsRef<str>>(self, expr: &'static str, values: &[T]) -> Self {
        if values.is_empty() {
            return self;
        }
        self.and(Clause::AnyOf {
            expr,
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        })
    }

    /// Adds an `IdIn` clause unless `ids` is empty.
    pub fn and_id_in(self, expr: &'static str, ids: &[Uuid]) -> Self {
        if ids.is_empty() {
            return self;
        }
        self.and(Clause::IdIn {
            expr,
            ids: ids.to_vec(),
        })
    }

    pub fn and_on_date(self, expr: &'static str, date: Option<NaiveDate>) -> Self {
        match date {
            Some(date) => self.and(Clause::OnDate { expr, date }),
            None => self,
        }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Appends ` WHERE TRUE AND (...) AND (...)`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");
        for clause in &self.clauses {
            qb.push(" AND (");
            match clause {
                Clause::Equals { expr, value } => {
                    qb.push(*expr);
                    qb.push(" = ");
                    qb.push_bind(value.clone());
                }
                Clause::IdEquals { expr, id } => {
                    qb.push(*expr);
                    qb.push(" = ");
                    qb.push_bind(*id);
                }
                Clause::IdIn { expr, ids } => {
                    qb.push(*expr);
                    qb.push(" = ANY(");
                    qb.push_bind(ids.clone());
                    qb.push(")");
                }
                Clause::IsFalse { expr } => {
                    qb.push(*expr);
                    qb.push(" = FALSE");
                }
                Clause::Contains { exprs, term } => {
                    let pattern = like_pattern(term);
                    for (i, expr) in exprs.iter().enumerate() {
                        if i > 0 {
                            qb.push(" OR ");
                        }
                        qb.push("LOWER(");
                        qb.push(*expr);
                        qb.push(") LIKE LOWER(");
                        qb.push_bind(pattern.clone());
                        qb.push(")");
                    }
                }
                Clause::AnyOf { expr, values } => {
                    qb.push(*expr);
                    qb.push(" = ANY(");
                    qb.push_bind(values.clone());
                    qb.push(")");
                }
                Clause::OnDate { expr, date } => {
                    qb.push("CAST(");
                    qb.push(*expr);
                    qb.push(" AS DATE) = ");
                    qb.push_bind(*date);
                }
            }
            qb.push(")");
        }
    }
}

/// `term` with LIKE metacharacters escaped (backslash is the default escape).
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%term%`, matched literally
fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["a.name", "a.code"];

    fn render(predicate: &Predicate) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM a");
        predicate.push_where(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn always_true_renders_bare_where() {
        assert_eq!(render(&Predicate::always()), "SELECT 1 FROM a WHERE TRUE");
    }

    #[test]
    fn search_is_trimmed_and_lowercased_in_sql() {
        let predicate = Predicate::always().and_search(FIELDS, Some("  LapTop "));
        assert_eq!(
            predicate.clauses(),
            &[Clause::Contains {
                exprs: FIELDS,
                term: "LapTop".to_string()
            }]
        );
        assert_eq!(
            render(&predicate),
            "SELECT 1 FROM a WHERE TRUE AND (LOWER(a.name) LIKE LOWER($1) OR LOWER(a.code) LIKE LOWER($2))"
        );
    }

    #[test]
    fn blank_filters_add_nothing() {
        let predicate = Predicate::always()
            .and_search(FIELDS, Some("   "))
            .and_search(FIELDS, None)
            .and_any_of::<String>("a.state", &[])
            .and_on_date("a.date", None);
        assert!(predicate.clauses().is_empty());
    }

    #[test]
    fn clauses_are_anded_and_search_fields_ored() {
        let predicate = Predicate::always()
            .and(Clause::Equals {
                expr: "a.location",
                value: "HN".to_string(),
            })
            .and_search(FIELDS, Some("mon"))
            .and_any_of("a.state", &["Available", "Recycled"])
            .and_on_date("a.date", NaiveDate::from_ymd_opt(2024, 7, 2))
            .and(Clause::IsFalse { expr: "a.disabled" });

        assert_eq!(
            render(&predicate),
            "SELECT 1 FROM a WHERE TRUE \
             AND (a.location = $1) \
             AND (LOWER(a.name) LIKE LOWER($2) OR LOWER(a.code) LIKE LOWER($3)) \
             AND (a.state = ANY($4)) \
             AND (CAST(a.date AS DATE) = $5) \
             AND (a.disabled = FALSE)"
        );
    }

    #[test]
    fn id_clauses_compare_uuid_columns_directly() {
        let id = Uuid::nil();
        let predicate = Predicate::always()
            .and(Clause::IdEquals { expr: "a.owner_id", id })
            .and_id_in("a.category_id", &[id])
            .and_id_in("a.other_id", &[]);
        assert_eq!(
            render(&predicate),
            "SELECT 1 FROM a WHERE TRUE AND (a.owner_id = $1) AND (a.category_id = ANY($2))"
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
