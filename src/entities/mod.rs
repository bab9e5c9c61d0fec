use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which label table an operation targets. Categories and tags share the
/// same shape and normalization rules; only the tables differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Category,
    Tag,
}

impl LabelKind {
    pub fn table(&self) -> &'static str {
        match self {
            LabelKind::Category => "categories",
            LabelKind::Tag => "tags",
        }
    }

    pub fn join_table(&self) -> &'static str {
        match self {
            LabelKind::Category => "site_categories",
            LabelKind::Tag => "site_tags",
        }
    }

    pub fn join_column(&self) -> &'static str {
        match self {
            LabelKind::Category => "category_id",
            LabelKind::Tag => "tag_id",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            LabelKind::Category => "category",
            LabelKind::Tag => "tag",
        }
    }
}

/// --- Tables ---

#[derive(Debug, Clone, FromRow)]
pub struct Site {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub image_url: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Label {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A label row joined with its derived site count.
#[derive(Debug, Clone, FromRow)]
pub struct LabelWithCount {
    pub id: Uuid,
    pub name: String,
    pub site_count: i64,
}
