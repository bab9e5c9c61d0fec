use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::{
    app_state::AppState,
    entities::LabelKind,
    labels::normalize_label,
    repositories::is_unique_violation,
    sites::dtos::{ErrorResponse, ValidationErrorResponse, ValidationIssue},
    taxonomy::dtos::{
        CreateLabelRequest, LabelConflictResponse, LabelListResponse, LabelResponse,
    },
};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "taxonomy",
    responses(
        (status = 200, description = "All categories with site counts", body = LabelListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> Response {
    list_labels(state, LabelKind::Category).await
}

#[utoipa::path(
    get,
    path = "/tags",
    tag = "taxonomy",
    responses(
        (status = 200, description = "All tags with site counts", body = LabelListResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn list_tags(State(state): State<AppState>) -> Response {
    list_labels(state, LabelKind::Tag).await
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "taxonomy",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Category created", body = LabelResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorResponse),
        (status = 409, description = "Name already taken", body = LabelConflictResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> Response {
    create_label(state, LabelKind::Category, payload).await
}

#[utoipa::path(
    post,
    path = "/tags",
    tag = "taxonomy",
    request_body = CreateLabelRequest,
    responses(
        (status = 201, description = "Tag created", body = LabelResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorResponse),
        (status = 409, description = "Name already taken", body = LabelConflictResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> Response {
    create_label(state, LabelKind::Tag, payload).await
}

async fn list_labels(state: AppState, kind: LabelKind) -> Response {
    match state.label_repo.list_with_counts(kind).await {
        Ok(labels) => {
            let items: Vec<LabelResponse> = labels.into_iter().map(LabelResponse::from).collect();
            let total = items.len() as i64;
            (StatusCode::OK, Json(LabelListResponse { items, total })).into_response()
        }
        Err(err) => {
            error!("Failed to load {} list: {err}", kind.noun());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to load {}s", kind.noun()),
                }),
            )
                .into_response()
        }
    }
}

async fn create_label(
    state: AppState,
    kind: LabelKind,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
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

    let Some(name) = normalize_label(&payload.name) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ValidationErrorResponse::new(vec![ValidationIssue {
                field: "name".to_string(),
                message: "Name must be between 1 and 64 characters".to_string(),
            }])),
        )
            .into_response();
    };

    match state.label_repo.find_by_name(kind, &name).await {
        Ok(Some(existing)) => return conflict(kind, existing.into()),
        Ok(None) => {}
        Err(err) => {
            error!("Failed to look up {} '{name}': {err}", kind.noun());
            return create_failed(kind);
        }
    }

    match state.label_repo.create(kind, &name).await {
        Ok(label) => (StatusCode::CREATED, Json(LabelResponse::from(label))).into_response(),
        Err(err) if is_unique_violation(&err) => {
            // Raced another creation of the same name; return the winner
            match state.label_repo.find_by_name(kind, &name).await {
                Ok(Some(existing)) => conflict(kind, existing.into()),
                _ => create_failed(kind),
            }
        }
        Err(err) => {
            error!("Failed to create {} '{name}': {err}", kind.noun());
            create_failed(kind)
        }
    }
}

fn conflict(kind: LabelKind, existing: LabelResponse) -> Response {
    let error = match kind {
        LabelKind::Category => "Category already exists",
        LabelKind::Tag => "Tag already exists",
    };
    let (category, tag) = match kind {
        LabelKind::Category => (Some(existing), None),
        LabelKind::Tag => (None, Some(existing)),
    };
    (
        StatusCode::CONFLICT,
        Json(LabelConflictResponse {
            error: error.to_string(),
            category,
            tag,
        }),
    )
        .into_response()
}

fn create_failed(kind: LabelKind) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Failed to create {}", kind.noun()),
        }),
    )
        .into_response()
}
