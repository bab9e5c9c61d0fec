use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use waypost::{app_state::AppState, config::Config, health, metadata, sites, taxonomy};

#[derive(OpenApi)]
#[openapi(
    paths(
        waypost::health::health_check,
        waypost::sites::handlers::list_sites,
        waypost::sites::handlers::create_site,
        waypost::taxonomy::handlers::list_categories,
        waypost::taxonomy::handlers::create_category,
        waypost::taxonomy::handlers::list_tags,
        waypost::taxonomy::handlers::create_tag,
        waypost::metadata::handlers::get_metadata,
    ),
    components(schemas(
        waypost::health::HealthResponse,
        waypost::sites::dtos::SiteResponse,
        waypost::sites::dtos::SiteListResponse,
        waypost::sites::dtos::CreateSiteRequest,
        waypost::sites::dtos::ErrorResponse,
        waypost::sites::dtos::ValidationIssue,
        waypost::sites::dtos::ValidationErrorResponse,
        waypost::taxonomy::dtos::LabelResponse,
        waypost::taxonomy::dtos::LabelListResponse,
        waypost::taxonomy::dtos::CreateLabelRequest,
        waypost::taxonomy::dtos::LabelConflictResponse,
        waypost::metadata::SiteMetadata,
        waypost::extractor::MetadataSource,
    )),
    tags(
        (name = "sites", description = "Directory entries"),
        (name = "taxonomy", description = "Categories and tags"),
        (name = "metadata", description = "Page metadata enrichment"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url())
        .await?;

    let state = AppState::new(pool, &config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", config.bind_addr());
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
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
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
