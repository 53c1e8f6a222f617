//! IT asset management server
//!
//! REST JSON API for tracking assets, their categories, the staff they are
//! assigned to and the requests to hand them back. Every list endpoint goes
//! through the filter / sort / paginate pipeline in [`query`].

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: Pool<Postgres>,
}
