use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::labels::{collapse_whitespace, unique_normalized_labels};
use crate::repositories::sites::SiteRecord;
use crate::urls;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_TITLE_LENGTH: usize = 256;
pub const MAX_DESCRIPTION_LENGTH: usize = 2048;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// One rejected field in a request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub error: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrorResponse {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self {
            error: "Validation failed".to_string(),
            issues,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSiteRequest {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A fully validated creation request: URL canonicalized, optional text
/// cleaned, labels normalized and deduplicated.
#[derive(Debug, Clone)]
pub struct ValidCreateSite {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl CreateSiteRequest {
    /// Validate every field independently and aggregate all issues rather
    /// than stopping at the first.
    pub fn validate(&self) -> Result<ValidCreateSite, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let url = match validate_url(&self.url) {
            Ok(url) => Some(url),
            Err(message) => {
                issues.push(ValidationIssue {
                    field: "url".to_string(),
                    message,
                });
                None
            }
        };

        let title = self.title.as_deref().and_then(collapse_whitespace);
        if let Some(title) = &title
            && title.chars().count() > MAX_TITLE_LENGTH
        {
            issues.push(ValidationIssue {
                field: "title".to_string(),
                message: format!("Title must be at most {MAX_TITLE_LENGTH} characters"),
            });
        }

        let description = self.description.as_deref().and_then(collapse_whitespace);
        if let Some(description) = &description
            && description.chars().count() > MAX_DESCRIPTION_LENGTH
        {
            issues.push(ValidationIssue {
                field: "description".to_string(),
                message: format!("Description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
            });
        }

        if !issues.is_empty() {
            return Err(issues);
        }

        Ok(ValidCreateSite {
            // url is Some here: a failure would have produced an issue
            url: url.unwrap_or_default(),
            title,
            description,
            categories: unique_normalized_labels(&self.categories),
            tags: unique_normalized_labels(&self.tags),
        })
    }
}

fn validate_url(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Err("URL is required".to_string());
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(format!("URL must be at most {MAX_URL_LENGTH} characters"));
    }
    urls::normalize_url(raw).ok_or_else(|| "URL must be a valid http(s) URL".to_string())
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub favicon_url: Option<String>,
    pub image_url: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl From<SiteRecord> for SiteResponse {
    fn from(record: SiteRecord) -> Self {
        let mut categories = record.categories;
        categories.sort();
        let mut tags = record.tags;
        tags.sort();
        Self {
            id: record.site.id,
            url: record.site.url,
            title: record.site.title,
            description: record.site.description.unwrap_or_default(),
            favicon_url: record.site.favicon_url,
            image_url: record.site.image_url,
            last_fetched_at: record.site.last_fetched_at,
            created_at: record.site.created_at,
            updated_at: record.site.updated_at,
            categories,
            tags,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteListResponse {
    pub items: Vec<SiteResponse>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Raw listing parameters. Numeric fields arrive as strings and are parsed
/// leniently; see [`crate::sites::query::parse_numeric_param`].
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListSitesParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}
