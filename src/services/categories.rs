//! Category management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        category::{Category, CreateCategory},
        user::UserClaims,
    },
    repository::{CategoryStore, UserStore},
};

#[derive(Clone)]
pub struct CategoriesService {
    categories: Arc<dyn CategoryStore>,
    users: Arc<dyn UserStore>,
}

impl CategoriesService {
    pub fn new(categories: Arc<dyn CategoryStore>, users: Arc<dyn UserStore>) -> Self {
        Self { categories, users }
    }

    #[tracing::instrument(skip(self, claims), fields(user_id = %claims.sub))]
    pub async fn list(&self, claims: &UserClaims) -> AppResult<Vec<Category>> {
        super::resolve_admin(self.users.as_ref(), claims).await?;
        self.categories.list().await
    }

    #[tracing::instrument(skip(self, claims, category), fields(user_id = %claims.sub))]
    pub async fn create(&self, claims: &UserClaims, category: CreateCategory) -> AppResult<Category> {
        super::resolve_admin(self.users.as_ref(), claims).await?;
        category.validate()?;
        let created = self.categories.create(&category).await?;
        tracing::info!(category_id = %created.id, prefix = %created.prefix, "Category created");
        Ok(created)
    }
}
