use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{error, info};
use url::Url;

use crate::{
    app_state::AppState,
    entities::LabelKind,
    metadata::fetch_site_metadata,
    repositories::{is_unique_violation, sites::NewSite},
    sites::{
        dtos::{
            CreateSiteRequest, ErrorResponse, ListSitesParams, SiteListResponse, SiteResponse,
            ValidationErrorResponse,
        },
        query::{SiteQuery, parse_numeric_param, total_pages},
    },
};

#[utoipa::path(
    get,
    path = "/sites",
    tag = "sites",
    params(ListSitesParams),
    responses(
        (status = 200, description = "One page of matching sites", body = SiteListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_sites(
    State(state): State<AppState>,
    Query(params): Query<ListSitesParams>,
) -> Response {
    let query = SiteQuery {
        q: params.q,
        category: params.category,
        tag: params.tag,
        page: parse_numeric_param(params.page.as_deref()),
        page_size: parse_numeric_param(params.page_size.as_deref()),
    };
    let filter = query.filter();
    let page_size = query.resolved_page_size();

    let total = match state.site_repo.count(&filter).await {
        Ok(total) => total,
        Err(err) => {
            error!("Failed to count sites: {err}");
            return internal_error("Failed to load sites");
        }
    };

    // The page is clamped down to the last one, so an out-of-range request
    // returns the final page instead of an empty list.
    let pages = total_pages(total, page_size);
    let page = query.requested_page().min(pages);
    let offset = (page - 1) * page_size;

    match state.site_repo.list(&filter, offset, page_size).await {
        Ok(records) => {
            let items: Vec<SiteResponse> = records.into_iter().map(SiteResponse::from).collect();
            (
                StatusCode::OK,
                Json(SiteListResponse {
                    items,
                    total,
                    page,
                    page_size,
                    total_pages: pages,
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to list sites: {err}");
            internal_error("Failed to load sites")
        }
    }
}

#[utoipa::path(
    post,
    path = "/sites",
    tag = "sites",
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = SiteResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorResponse),
        (status = 409, description = "URL already exists", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_site(
    State(state): State<AppState>,
    payload: Result<Json<CreateSiteRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(payload)) = payload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid JSON payload".to_string(),
            }),
        )
            .into_response();
    };

    let valid = match payload.validate() {
        Ok(valid) => valid,
        Err(issues) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorResponse::new(issues)),
            )
                .into_response();
        }
    };

    match state.site_repo.find_by_url(&valid.url).await {
        Ok(Some(_)) => return conflict(&valid.url),
        Ok(None) => {}
        Err(err) => {
            error!("Failed to check for existing site: {err}");
            return internal_error("Failed to create site");
        }
    }

    // Enrichment failure never blocks creation; the record just stays sparse.
    let metadata = fetch_site_metadata(&valid.url, &state.fetch_options)
        .await
        .ok();

    let mut category_ids = Vec::with_capacity(valid.categories.len());
    for name in &valid.categories {
        match state.label_repo.ensure(LabelKind::Category, name).await {
            Ok(label) => category_ids.push(label.id),
            Err(err) => {
                error!("Failed to ensure category '{name}': {err}");
                return internal_error("Failed to create site");
            }
        }
    }

    let mut tag_ids = Vec::with_capacity(valid.tags.len());
    for name in &valid.tags {
        match state.label_repo.ensure(LabelKind::Tag, name).await {
            Ok(label) => tag_ids.push(label.id),
            Err(err) => {
                error!("Failed to ensure tag '{name}': {err}");
                return internal_error("Failed to create site");
            }
        }
    }

    let title = valid
        .title
        .clone()
        .or_else(|| metadata.as_ref().and_then(|m| m.title.clone()))
        .unwrap_or_else(|| hostname_of(&valid.url));
    let description = valid
        .description
        .clone()
        .or_else(|| metadata.as_ref().and_then(|m| m.description.clone()));

    let new_site = NewSite {
        url: valid.url.clone(),
        title,
        description,
        favicon_url: metadata.as_ref().and_then(|m| m.favicon_url.clone()),
        image_url: metadata.as_ref().and_then(|m| m.image_url.clone()),
        last_fetched_at: Some(
            metadata
                .as_ref()
                .map(|m| m.fetched_at)
                .unwrap_or_else(Utc::now),
        ),
        category_ids,
        tag_ids,
    };

    match state.site_repo.create(new_site).await {
        Ok(record) => {
            info!("Created site {} ({})", record.site.id, record.site.url);
            (StatusCode::CREATED, Json(SiteResponse::from(record))).into_response()
        }
        // Lost a race with a concurrent submission of the same URL
        Err(err) if is_unique_violation(&err) => conflict(&valid.url),
        Err(err) => {
            error!("Failed to create site: {err}");
            internal_error("Failed to create site")
        }
    }
}

fn conflict(url: &str) -> Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: format!("Site with URL {url} already exists"),
        }),
    )
        .into_response()
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn hostname_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Site;
    use crate::fetcher::FetchOptions;
    use crate::repositories::labels::MockLabelRepositoryTrait;
    use crate::repositories::sites::{MockSiteRepositoryTrait, SiteRecord};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
        routing::get,
    };
    use sqlx::{Pool, Postgres};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_app(site_repo: MockSiteRepositoryTrait, label_repo: MockLabelRepositoryTrait) -> Router {
        let state = AppState {
            site_repo: Arc::new(site_repo),
            label_repo: Arc::new(label_repo),
            fetch_options: FetchOptions::default(),
            db_pool: Pool::<Postgres>::connect_lazy("postgresql://dummy")
                .expect("Failed to create test pool"),
        };
        Router::new()
            .route("/sites", get(list_sites).post(create_site))
            .with_state(state)
    }

    fn sample_site(url: &str) -> Site {
        Site {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: "Sample".to_string(),
            description: None,
            favicon_url: None,
            image_url: None,
            last_fetched_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_clamps_out_of_range_page() {
        let mut site_repo = MockSiteRepositoryTrait::new();
        site_repo.expect_count().returning(|_| Ok(25));
        site_repo.expect_list().returning(|_, offset, limit| {
            assert_eq!(offset, 24);
            assert_eq!(limit, 12);
            Ok(vec![SiteRecord {
                site: sample_site("https://example.com/"),
                categories: Vec::new(),
                tags: Vec::new(),
            }])
        });

        let app = test_app(site_repo, MockLabelRepositoryTrait::new());
        let request = Request::builder()
            .uri("/sites?page=10&pageSize=12")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total"], 25);
        assert_eq!(body["page"], 3);
        assert_eq!(body["pageSize"], 12);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_clamps_page_size() {
        let mut site_repo = MockSiteRepositoryTrait::new();
        site_repo.expect_count().returning(|_| Ok(0));
        site_repo.expect_list().returning(|_, _, limit| {
            assert_eq!(limit, 48);
            Ok(Vec::new())
        });

        let app = test_app(site_repo, MockLabelRepositoryTrait::new());
        let request = Request::builder()
            .uri("/sites?pageSize=1000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["pageSize"], 48);
        assert_eq!(body["totalPages"], 1);
    }

    #[tokio::test]
    async fn test_list_storage_failure_is_500() {
        let mut site_repo = MockSiteRepositoryTrait::new();
        site_repo
            .expect_count()
            .returning(|_| Err(anyhow::anyhow!("connection refused")));

        let app = test_app(site_repo, MockLabelRepositoryTrait::new());
        let request = Request::builder()
            .uri("/sites")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_body_with_issues() {
        let app = test_app(
            MockSiteRepositoryTrait::new(),
            MockLabelRepositoryTrait::new(),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/sites")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "url": "" }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["issues"][0]["field"], "url");
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_json() {
        let app = test_app(
            MockSiteRepositoryTrait::new(),
            MockLabelRepositoryTrait::new(),
        );
        let request = Request::builder()
            .method("POST")
            .uri("/sites")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn test_create_existing_url_conflicts_before_any_fetch() {
        let mut site_repo = MockSiteRepositoryTrait::new();
        site_repo.expect_find_by_url().returning(|url| {
            assert_eq!(url, "https://example.com/");
            Ok(Some(sample_site(url)))
        });

        let app = test_app(site_repo, MockLabelRepositoryTrait::new());
        let request = Request::builder()
            .method("POST")
            .uri("/sites")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "url": "example.com" }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_hostname_of_falls_back_to_input() {
        assert_eq!(hostname_of("https://docs.example.com/x"), "docs.example.com");
        assert_eq!(hostname_of("not a url"), "not a url");
    }
}
