use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{Label, LabelWithCount};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLabelRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub id: Uuid,
    pub name: String,
    pub site_count: i64,
}

impl From<LabelWithCount> for LabelResponse {
    fn from(label: LabelWithCount) -> Self {
        Self {
            id: label.id,
            name: label.name,
            site_count: label.site_count,
        }
    }
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        // A freshly created label has no associations yet
        Self {
            id: label.id,
            name: label.name,
            site_count: 0,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LabelListResponse {
    pub items: Vec<LabelResponse>,
    pub total: i64,
}

/// Conflict body for duplicate label names: the existing entity rides along
/// under its kind's key.
#[derive(Debug, Serialize, ToSchema)]
pub struct LabelConflictResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<LabelResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<LabelResponse>,
}
