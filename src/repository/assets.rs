//! Assets repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        asset::{
            format_asset_code, Asset, AssetDetails, AssetHistoryEntry, AssetListItem,
            AssetSortColumn, NewAsset, UpdateAsset,
        },
        enums::AssignmentState,
    },
    query::{ListQuery, Page},
};

const ASSET_COLUMNS: &str = "id, asset_code, category_id, name, specification, installed_date, \
     state, location, created_at, last_updated";

const LIST_PROJECTION: &str = "s.id, s.asset_code, s.name, c.name AS category, s.state";
const LIST_FROM: &str = "FROM assets s JOIN categories c ON c.id = s.category_id";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn list(&self, query: &ListQuery<AssetSortColumn>) -> AppResult<Page<AssetListItem>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>>;

    /// Asset with its category name and assignment history
    async fn find_details(&self, id: Uuid) -> AppResult<Option<AssetDetails>>;

    /// Insert an asset with the next code of its category
    async fn create(&self, asset: &NewAsset) -> AppResult<Asset>;

    async fn update(&self, id: Uuid, asset: &UpdateAsset) -> AppResult<Asset>;

    /// Whether the asset is held by an assignment in a non-terminal state
    async fn has_active_assignment(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct AssetsRepository {
    pool: Pool<Postgres>,
}

impl AssetsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn history(&self, id: Uuid) -> AppResult<Vec<AssetHistoryEntry>> {
        let history = sqlx::query_as::<_, AssetHistoryEntry>(
            r#"
            SELECT a.assigned_date, ato.username AS assigned_to, aby.username AS assigned_by,
                   rr.returned_date
            FROM assignments a
            JOIN users ato ON ato.id = a.assigned_to_id
            JOIN users aby ON aby.id = a.assigned_by_id
            LEFT JOIN returning_requests rr
                   ON rr.assignment_id = a.id AND rr.state = 'Completed'
            WHERE a.asset_id = $1 AND a.state <> 'Declined'
            ORDER BY a.assigned_date DESC, a.last_updated DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }
}

#[async_trait]
impl AssetStore for AssetsRepository {
    async fn list(&self, query: &ListQuery<AssetSortColumn>) -> AppResult<Page<AssetListItem>> {
        super::fetch_page(&self.pool, query, LIST_PROJECTION, LIST_FROM).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Asset>> {
        let asset = sqlx::query_as::<_, Asset>(&format!(
            "SELECT {} FROM assets WHERE id = $1",
            ASSET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(asset)
    }

    async fn find_details(&self, id: Uuid) -> AppResult<Option<AssetDetails>> {
        let row = sqlx::query(
            r#"
            SELECT s.id, s.asset_code, s.name, s.category_id, c.name AS category,
                   s.specification, s.installed_date, s.state, s.location
            FROM assets s
            JOIN categories c ON c.id = s.category_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(AssetDetails {
            id: row.get("id"),
            asset_code: row.get("asset_code"),
            name: row.get("name"),
            category_id: row.get("category_id"),
            category: row.get("category"),
            specification: row.get("specification"),
            installed_date: row.get("installed_date"),
            state: row.get("state"),
            location: row.get("location"),
            history: self.history(id).await?,
        }))
    }

    async fn create(&self, asset: &NewAsset) -> AppResult<Asset> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes code generation within a category
        let prefix: String =
            sqlx::query_scalar("SELECT prefix FROM categories WHERE id = $1 FOR UPDATE")
                .bind(asset.category_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Category with id {} not found", asset.category_id))
                })?;

        let last: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(CAST(SUBSTRING(asset_code FROM $2) AS BIGINT))
            FROM assets
            WHERE category_id = $1
            "#,
        )
        .bind(asset.category_id)
        .bind(prefix.len() as i32 + 1)
        .fetch_one(&mut *tx)
        .await?;

        let code = format_asset_code(&prefix, last.unwrap_or(0) + 1);

        let created = sqlx::query_as::<_, Asset>(&format!(
            r#"
            INSERT INTO assets (id, asset_code, category_id, name, specification,
                                installed_date, state, location, created_at, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&code)
        .bind(asset.category_id)
        .bind(asset.name.trim())
        .bind(&asset.specification)
        .bind(asset.installed_date)
        .bind(asset.state)
        .bind(&asset.location)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Asset code already exists"))?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, asset: &UpdateAsset) -> AppResult<Asset> {
        sqlx::query_as::<_, Asset>(&format!(
            r#"
            UPDATE assets
            SET name = $2, specification = $3, installed_date = $4, state = $5,
                last_updated = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ASSET_COLUMNS
        ))
        .bind(id)
        .bind(asset.name.trim())
        .bind(&asset.specification)
        .bind(asset.installed_date)
        .bind(asset.state)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Asset with id {} not found", id)))
    }

    async fn has_active_assignment(&self, id: Uuid) -> AppResult<bool> {
        let active: Vec<&str> = AssignmentState::ACTIVE.iter().map(|s| s.as_str()).collect();
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM assignments WHERE asset_id = $1 AND state = ANY($2))",
        )
        .bind(id)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
