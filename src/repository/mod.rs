//! Repository layer for database operations
//!
//! Each entity has a store trait used by the services and a PostgreSQL
//! implementation. List queries share [`fetch_page`].

pub mod assets;
pub mod assignments;
pub mod categories;
pub mod returning_requests;
pub mod users;

use std::sync::Arc;

use sqlx::{postgres::PgRow, FromRow, Pool, Postgres};

use crate::{
    error::AppResult,
    query::{ListQuery, Page, SortColumn},
};

pub use assets::{AssetStore, AssetsRepository};
pub use assignments::{AssignmentStore, AssignmentsRepository};
pub use categories::{CategoriesRepository, CategoryStore};
pub use returning_requests::{ReturningRequestStore, ReturningRequestsRepository};
pub use users::{UserStore, UsersRepository};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub categories: Arc<dyn CategoryStore>,
    pub assets: Arc<dyn AssetStore>,
    pub users: Arc<dyn UserStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub returning_requests: Arc<dyn ReturningRequestStore>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            categories: Arc::new(CategoriesRepository::new(pool.clone())),
            assets: Arc::new(AssetsRepository::new(pool.clone())),
            users: Arc::new(UsersRepository::new(pool.clone())),
            assignments: Arc::new(AssignmentsRepository::new(pool.clone())),
            returning_requests: Arc::new(ReturningRequestsRepository::new(pool.clone())),
            pool,
        }
    }
}

/// Run the count and page statements of a list query.
///
/// The count covers the filtered set; only the requested window is projected.
pub(crate) async fn fetch_page<T, C>(
    pool: &Pool<Postgres>,
    query: &ListQuery<C>,
    projection: &str,
    from: &str,
) -> AppResult<Page<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    C: SortColumn,
{
    let mut count = query.count_sql(from);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut page = query.page_sql(projection, from);
    let items = page.build_query_as::<T>().fetch_all(pool).await?;

    Ok(Page::new(items, query.paging, total))
}
