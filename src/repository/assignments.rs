//! Assignments repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::{
            Assignment, AssignmentListItem, AssignmentSortColumn, MyAssignmentItem,
            MyAssignmentSortColumn, NewAssignment,
        },
        enums::AssignmentState,
    },
    query::{ListQuery, Page},
};

const LIST_PROJECTION: &str = "a.id, s.asset_code, s.name AS asset_name, ato.username AS assigned_to, \
     aby.username AS assigned_by, a.assigned_date, a.state";
const LIST_FROM: &str = "FROM assignments a \
     JOIN assets s ON s.id = a.asset_id \
     JOIN users ato ON ato.id = a.assigned_to_id \
     JOIN users aby ON aby.id = a.assigned_by_id";

const OWN_PROJECTION: &str =
    "a.id, s.asset_code, s.name AS asset_name, c.name AS category, a.assigned_date, a.state";
const OWN_FROM: &str = "FROM assignments a \
     JOIN assets s ON s.id = a.asset_id \
     JOIN categories c ON c.id = s.category_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn list(
        &self,
        query: &ListQuery<AssignmentSortColumn>,
    ) -> AppResult<Page<AssignmentListItem>>;

    /// Assignments of one user; the query carries the assignee scope.
    async fn list_own(
        &self,
        query: &ListQuery<MyAssignmentSortColumn>,
    ) -> AppResult<Page<MyAssignmentItem>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assignment>>;

    /// Insert a `WaitingForAcceptance` assignment and flip its asset from
    /// `Available` to `NotAvailable` in one transaction.
    async fn create(&self, assignment: &NewAssignment) -> AppResult<Uuid>;

    /// Move a `WaitingForAcceptance` assignment to `Accepted` or `Declined`.
    /// Declining frees the asset.
    async fn respond(&self, id: Uuid, accept: bool) -> AppResult<()>;
}

#[derive(Clone)]
pub struct AssignmentsRepository {
    pool: Pool<Postgres>,
}

impl AssignmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentStore for AssignmentsRepository {
    async fn list(
        &self,
        query: &ListQuery<AssignmentSortColumn>,
    ) -> AppResult<Page<AssignmentListItem>> {
        super::fetch_page(&self.pool, query, LIST_PROJECTION, LIST_FROM).await
    }

    async fn list_own(
        &self,
        query: &ListQuery<MyAssignmentSortColumn>,
    ) -> AppResult<Page<MyAssignmentItem>> {
        super::fetch_page(&self.pool, query, OWN_PROJECTION, OWN_FROM).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(
            r#"
            SELECT a.id, a.asset_id, a.assigned_by_id, a.assigned_to_id, a.note,
                   a.assigned_date, a.state, a.last_updated,
                   s.location AS asset_location, aby.location AS assigned_by_location
            FROM assignments a
            JOIN assets s ON s.id = a.asset_id
            JOIN users aby ON aby.id = a.assigned_by_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn create(&self, assignment: &NewAssignment) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            r#"
            UPDATE assets
            SET state = 'NotAvailable', last_updated = NOW()
            WHERE id = $1 AND state = 'Available'
            "#,
        )
        .bind(assignment.asset_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            return Err(AppError::BadRequest(
                "Asset is not available for assignment".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO assignments (id, asset_id, assigned_by_id, assigned_to_id, note,
                                     assigned_date, state, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            "#,
        )
        .bind(id)
        .bind(assignment.asset_id)
        .bind(assignment.assigned_by_id)
        .bind(assignment.assigned_to_id)
        .bind(&assignment.note)
        .bind(assignment.assigned_date)
        .bind(AssignmentState::WaitingForAcceptance)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Asset already has an active assignment"))?;

        tx.commit().await?;
        Ok(id)
    }

    async fn respond(&self, id: Uuid, accept: bool) -> AppResult<()> {
        let state = if accept {
            AssignmentState::Accepted
        } else {
            AssignmentState::Declined
        };
        let mut tx = self.pool.begin().await?;

        let asset_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE assignments
            SET state = $2, last_updated = NOW()
            WHERE id = $1 AND state = 'WaitingForAcceptance'
            RETURNING asset_id
            "#,
        )
        .bind(id)
        .bind(state)
        .fetch_optional(&mut *tx)
        .await?;

        let asset_id = asset_id.ok_or_else(|| {
            AppError::BadRequest("Assignment is not waiting for acceptance".to_string())
        })?;

        if !accept {
            sqlx::query("UPDATE assets SET state = 'Available', last_updated = NOW() WHERE id = $1")
                .bind(asset_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
