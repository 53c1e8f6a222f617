//! Asset management service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        asset::{Asset, AssetDetails, AssetFilterRequest, AssetListItem, CreateAsset, NewAsset, UpdateAsset},
        user::UserClaims,
    },
    query::{ListQuery, Page, Paging},
    repository::{AssetStore, CategoryStore, UserStore},
};

#[derive(Clone)]
pub struct AssetsService {
    assets: Arc<dyn AssetStore>,
    categories: Arc<dyn CategoryStore>,
    users: Arc<dyn UserStore>,
}

fn asset_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Asset with id {} not found", id))
}

impl AssetsService {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        categories: Arc<dyn CategoryStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            assets,
            categories,
            users,
        }
    }

    /// Assets of the admin's location matching the filter
    #[tracing::instrument(skip(self, claims, request), fields(user_id = %claims.sub))]
    pub async fn filter(
        &self,
        claims: &UserClaims,
        request: &AssetFilterRequest,
    ) -> AppResult<Page<AssetListItem>> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        let query = ListQuery::new(
            request.specification(&admin.location),
            request.ordering(),
            Paging::from_request(request.page_number, request.page_size),
        );
        self.assets.list(&query).await
    }

    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn get(&self, claims: &UserClaims, id: Uuid) -> AppResult<AssetDetails> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        self.assets
            .find_details(id)
            .await?
            .filter(|asset| asset.location == admin.location)
            .ok_or_else(|| asset_not_found(id))
    }

    #[tracing::instrument(skip(self, claims, asset), fields(user_id = %claims.sub))]
    pub async fn create(&self, claims: &UserClaims, asset: CreateAsset) -> AppResult<Asset> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        asset.validate()?;
        if !asset.state.is_initial() {
            return Err(AppError::Validation(
                "A new asset must be Available or NotAvailable".to_string(),
            ));
        }

        self.categories
            .find_by_id(asset.category_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Category with id {} not found", asset.category_id))
            })?;

        let created = self
            .assets
            .create(&NewAsset {
                category_id: asset.category_id,
                name: asset.name,
                specification: asset.specification,
                installed_date: asset.installed_date,
                state: asset.state,
                location: admin.location,
            })
            .await?;
        tracing::info!(asset_id = %created.id, asset_code = %created.asset_code, "Asset created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, claims, asset), fields(user_id = %claims.sub))]
    pub async fn update(&self, claims: &UserClaims, id: Uuid, asset: UpdateAsset) -> AppResult<Asset> {
        let admin = super::resolve_admin(self.users.as_ref(), claims).await?;
        asset.validate()?;

        self.assets
            .find_by_id(id)
            .await?
            .filter(|existing| existing.location == admin.location)
            .ok_or_else(|| asset_not_found(id))?;

        if self.assets.has_active_assignment(id).await? {
            return Err(AppError::BadRequest(
                "Asset is assigned and cannot be edited".to_string(),
            ));
        }

        let updated = self.assets.update(id, &asset).await?;
        tracing::info!(asset_id = %id, state = %updated.state, "Asset updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::{
        models::enums::{AssetState, Role},
        query::Clause,
        repository::{assets::MockAssetStore, categories::MockCategoryStore, users::MockUserStore},
        services::test_support::{claims_for, user},
    };

    fn asset(location: &str) -> Asset {
        let now = Utc::now();
        Asset {
            id: Uuid::new_v4(),
            asset_code: "LA000001".to_string(),
            category_id: Uuid::new_v4(),
            name: "Laptop HP".to_string(),
            specification: None,
            installed_date: None,
            state: AssetState::Available,
            location: location.to_string(),
            created_at: now,
            last_updated: now,
        }
    }

    fn admin_users(location: &str) -> (MockUserStore, UserClaims) {
        let admin = user(Role::Admin, location);
        let claims = claims_for(&admin);
        let mut users = MockUserStore::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(admin.clone())));
        (users, claims)
    }

    fn update_request() -> UpdateAsset {
        UpdateAsset {
            name: "Laptop HP Probook".to_string(),
            specification: Some("Core i5".to_string()),
            installed_date: None,
            state: AssetState::NotAvailable,
        }
    }

    #[tokio::test]
    async fn filter_is_scoped_to_admin_location_with_default_paging() {
        let (users, claims) = admin_users("DN");
        let mut assets = MockAssetStore::new();
        assets
            .expect_list()
            .withf(|query| {
                query.paging == Paging::default()
                    && query.predicate.clauses().first()
                        == Some(&Clause::Equals {
                            expr: "s.location",
                            value: "DN".to_string(),
                        })
            })
            .returning(|query| Ok(Page::new(Vec::new(), query.paging, 0)));

        let service = AssetsService::new(
            Arc::new(assets),
            Arc::new(MockCategoryStore::new()),
            Arc::new(users),
        );
        let request = AssetFilterRequest {
            page_number: Some(0),
            page_size: Some(20),
            ..Default::default()
        };
        let page = service.filter(&claims, &request).await.unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.page_size, 5);
    }

    #[tokio::test]
    async fn asset_of_other_location_is_not_found() {
        let (users, claims) = admin_users("HCM");
        let mut assets = MockAssetStore::new();
        let stored = asset("HN");
        assets
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        assets.expect_update().never();

        let service = AssetsService::new(
            Arc::new(assets),
            Arc::new(MockCategoryStore::new()),
            Arc::new(users),
        );
        let err = service
            .update(&claims, Uuid::new_v4(), update_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn assigned_asset_cannot_be_edited() {
        let (users, claims) = admin_users("HCM");
        let mut assets = MockAssetStore::new();
        let stored = asset("HCM");
        assets
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        assets.expect_has_active_assignment().returning(|_| Ok(true));
        assets.expect_update().never();

        let service = AssetsService::new(
            Arc::new(assets),
            Arc::new(MockCategoryStore::new()),
            Arc::new(users),
        );
        let err = service
            .update(&claims, Uuid::new_v4(), update_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn new_asset_cannot_start_recycled() {
        let (users, claims) = admin_users("HCM");
        let service = AssetsService::new(
            Arc::new(MockAssetStore::new()),
            Arc::new(MockCategoryStore::new()),
            Arc::new(users),
        );
        let request = CreateAsset {
            name: "Monitor Dell".to_string(),
            category_id: Uuid::new_v4(),
            specification: None,
            installed_date: None,
            state: AssetState::Recycled,
        };
        let err = service.create(&claims, request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn new_asset_takes_admin_location() {
        let (users, claims) = admin_users("HN");
        let mut categories = MockCategoryStore::new();
        categories.expect_find_by_id().returning(|id| {
            Ok(Some(crate::models::category::Category {
                id,
                name: "Laptop".to_string(),
                prefix: "LA".to_string(),
            }))
        });
        let mut assets = MockAssetStore::new();
        assets
            .expect_create()
            .withf(|new| new.location == "HN" && new.state == AssetState::Available)
            .returning(|_| Ok(asset("HN")));

        let service = AssetsService::new(Arc::new(assets), Arc::new(categories), Arc::new(users));
        let request = CreateAsset {
            name: "Laptop HP".to_string(),
            category_id: Uuid::new_v4(),
            specification: None,
            installed_date: None,
            state: AssetState::Available,
        };
        let created = service.create(&claims, request).await.unwrap();
        assert_eq!(created.location, "HN");
    }

    #[tokio::test]
    async fn get_of_unknown_asset_is_not_found() {
        let (users, claims) = admin_users("HCM");
        let mut assets = MockAssetStore::new();
        assets.expect_find_details().returning(|_| Ok(None));

        let service = AssetsService::new(
            Arc::new(assets),
            Arc::new(MockCategoryStore::new()),
            Arc::new(users),
        );
        let err = service.get(&claims, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
