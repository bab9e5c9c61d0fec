use axum::{Router, routing::get};
use sqlx::{Pool, Postgres};

use waypost::{app_state::AppState, config::Config, health, metadata, sites, taxonomy};

pub fn test_app(pool: Pool<Postgres>) -> Router {
    let state = AppState::new(pool, &Config::default());

    Router::new()
        .route("/healthz", get(health::health_check))
        .route(
            "/sites",
            get(sites::handlers::list_sites).post(sites::handlers::create_site),
        )
        .route(
            "/categories",
            get(taxonomy::handlers::list_categories).post(taxonomy::handlers::create_category),
        )
        .route(
            "/tags",
            get(taxonomy::handlers::list_tags).post(taxonomy::handlers::create_tag),
        )
        .route("/metadata", get(metadata::handlers::get_metadata))
        .with_state(state)
}
