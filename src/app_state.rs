use crate::config::Config;
use crate::fetcher::FetchOptions;
use crate::repositories::{
    LabelRepository, LabelRepositoryTrait, SiteRepository, SiteRepositoryTrait,
};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub site_repo: Arc<dyn SiteRepositoryTrait + Send + Sync>,
    pub label_repo: Arc<dyn LabelRepositoryTrait + Send + Sync>,
    pub fetch_options: FetchOptions,
    pub db_pool: Pool<Postgres>,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, config: &Config) -> Self {
        Self {
            site_repo: Arc::new(SiteRepository::new(pool.clone())),
            label_repo: Arc::new(LabelRepository::new(pool.clone())),
            fetch_options: FetchOptions::from_config(config),
            db_pool: pool,
        }
    }
}
