use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    app_state::AppState,
    metadata::{MetadataError, SiteMetadata, fetch_site_metadata},
    sites::dtos::ErrorResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MetadataParams {
    pub url: Option<String>,
}

#[utoipa::path(
    get,
    path = "/metadata",
    tag = "metadata",
    params(MetadataParams),
    responses(
        (status = 200, description = "Best-effort metadata for the page", body = SiteMetadata),
        (status = 400, description = "Missing or invalid url parameter", body = ErrorResponse)
    )
)]
pub async fn get_metadata(
    State(state): State<AppState>,
    Query(params): Query<MetadataParams>,
) -> Response {
    let raw = params.url.unwrap_or_default();
    match fetch_site_metadata(&raw, &state.fetch_options).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(MetadataError::InvalidUrl) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "url query param is required".to_string(),
            }),
        )
            .into_response(),
    }
}
