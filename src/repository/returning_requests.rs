//! Returning requests repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::ReturningRequestState,
        returning_request::{ReturningRequest, ReturningRequestListItem, ReturningRequestSortColumn},
    },
    query::{ListQuery, Page},
};

const LIST_PROJECTION: &str = "rr.id, s.asset_code, s.name AS asset_name, rb.username AS requested_by, \
     a.assigned_date, ab.username AS accepted_by, rr.returned_date, rr.state";
const LIST_FROM: &str = "FROM returning_requests rr \
     JOIN assignments a ON a.id = rr.assignment_id \
     JOIN assets s ON s.id = a.asset_id \
     JOIN users rb ON rb.id = rr.requested_by_id \
     LEFT JOIN users ab ON ab.id = rr.accepted_by_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReturningRequestStore: Send + Sync {
    async fn list(
        &self,
        query: &ListQuery<ReturningRequestSortColumn>,
    ) -> AppResult<Page<ReturningRequestListItem>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReturningRequest>>;

    /// Open a request and move its `Accepted` assignment to
    /// `WaitingForReturning` in one transaction.
    async fn create(&self, assignment_id: Uuid, requested_by: Uuid) -> AppResult<Uuid>;

    /// Close a pending request: assignment `Returned`, asset `Available`.
    async fn complete(&self, id: Uuid, accepted_by: Uuid, returned_date: NaiveDate) -> AppResult<()>;

    /// Withdraw a pending request: assignment back to `Accepted`.
    async fn cancel(&self, id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct ReturningRequestsRepository {
    pool: Pool<Postgres>,
}

impl ReturningRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_pending() -> AppError {
    AppError::BadRequest("Returning request is not waiting for returning".to_string())
}

#[async_trait]
impl ReturningRequestStore for ReturningRequestsRepository {
    async fn list(
        &self,
        query: &ListQuery<ReturningRequestSortColumn>,
    ) -> AppResult<Page<ReturningRequestListItem>> {
        super::fetch_page(&self.pool, query, LIST_PROJECTION, LIST_FROM).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReturningRequest>> {
        let request = sqlx::query_as::<_, ReturningRequest>(
            r#"
            SELECT rr.id, rr.assignment_id, rr.requested_by_id, rr.accepted_by_id,
                   rr.returned_date, rr.state, rr.created_at, rr.last_updated,
                   a.asset_id, s.location AS asset_location
            FROM returning_requests rr
            JOIN assignments a ON a.id = rr.assignment_id
            JOIN assets s ON s.id = a.asset_id
            WHERE rr.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn create(&self, assignment_id: Uuid, requested_by: Uuid) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let moved = sqlx::query(
            r#"
            UPDATE assignments
            SET state = 'WaitingForReturning', last_updated = NOW()
            WHERE id = $1 AND state = 'Accepted'
            "#,
        )
        .bind(assignment_id)
        .execute(&mut *tx)
        .await?;

        if moved.rows_affected() == 0 {
            return Err(AppError::BadRequest("Assignment is not accepted".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO returning_requests (id, assignment_id, requested_by_id, state,
                                            created_at, last_updated)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(assignment_id)
        .bind(requested_by)
        .bind(ReturningRequestState::WaitingForReturning)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "Assignment already has a pending returning request")
        })?;

        tx.commit().await?;
        Ok(id)
    }

    async fn complete(&self, id: Uuid, accepted_by: Uuid, returned_date: NaiveDate) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let assignment_id: Uuid = sqlx::query_scalar(
            r#"
            UPDATE returning_requests
            SET state = 'Completed', accepted_by_id = $2, returned_date = $3, last_updated = NOW()
            WHERE id = $1 AND state = 'WaitingForReturning'
            RETURNING assignment_id
            "#,
        )
        .bind(id)
        .bind(accepted_by)
        .bind(returned_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(not_pending)?;

        let asset_id: Uuid = sqlx::query_scalar(
            r#"
            UPDATE assignments
            SET state = 'Returned', last_updated = NOW()
            WHERE id = $1
            RETURNING asset_id
            "#,
        )
        .bind(assignment_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE assets SET state = 'Available', last_updated = NOW() WHERE id = $1")
            .bind(asset_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let assignment_id: Uuid = sqlx::query_scalar(
            r#"
            UPDATE returning_requests
            SET state = 'Cancelled', last_updated = NOW()
            WHERE id = $1 AND state = 'WaitingForReturning'
            RETURNING assignment_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(not_pending)?;

        sqlx::query(
            r#"
            UPDATE assignments
            SET state = 'Accepted', last_updated = NOW()
            WHERE id = $1 AND state = 'WaitingForReturning'
            "#,
        )
        .bind(assignment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
