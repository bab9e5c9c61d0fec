use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::entities::{LabelKind, Site};
use crate::sites::query::SiteFilter;

/// A site row together with its associated label names.
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub site: Site,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// Input for site creation. Label rows must already exist; only the join
/// rows are written here.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub image_url: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub category_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteRepositoryTrait {
    /// Number of sites matching the filter, pre-pagination.
    async fn count(&self, filter: &SiteFilter) -> Result<i64>;
    /// One page of matching sites, newest-created first.
    async fn list(&self, filter: &SiteFilter, offset: i64, limit: i64) -> Result<Vec<SiteRecord>>;
    /// Exact, case-sensitive URL lookup.
    async fn find_by_url(&self, url: &str) -> Result<Option<Site>>;
    /// Insert a site and its label associations in one transaction. A
    /// duplicate URL fails with a unique violation.
    async fn create(&self, site: NewSite) -> Result<SiteRecord>;
}

#[derive(Clone)]
pub struct SiteRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct SiteLabelRow {
    site_id: Uuid,
    name: String,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Map of site id to associated label names for one label kind.
    async fn label_names(
        &self,
        kind: LabelKind,
        site_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<String>>> {
        if site_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT j.site_id, l.name FROM {join} j \
             JOIN {table} l ON l.id = j.{column} \
             WHERE j.site_id = ANY($1)",
            join = kind.join_table(),
            table = kind.table(),
            column = kind.join_column(),
        );
        let rows: Vec<SiteLabelRow> = sqlx::query_as(&sql)
            .bind(site_ids)
            .fetch_all(&self.pool)
            .await?;

        let mut names: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            names.entry(row.site_id).or_default().push(row.name);
        }
        Ok(names)
    }

    async fn attach_labels(&self, sites: Vec<Site>) -> Result<Vec<SiteRecord>> {
        let ids: Vec<Uuid> = sites.iter().map(|site| site.id).collect();
        let mut categories = self.label_names(LabelKind::Category, &ids).await?;
        let mut tags = self.label_names(LabelKind::Tag, &ids).await?;

        Ok(sites
            .into_iter()
            .map(|site| {
                let id = site.id;
                SiteRecord {
                    site,
                    categories: categories.remove(&id).unwrap_or_default(),
                    tags: tags.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

/// Append WHERE conditions for the filter. The text filter ORs over title,
/// description and URL; label filters require a case-insensitive name match
/// on at least one association; everything ANDs together.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &SiteFilter) {
    builder.push(" WHERE TRUE");

    if let Some(q) = &filter.q {
        let pattern = format!("%{}%", escape_like(q));
        builder
            .push(" AND (s.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR s.url ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = &filter.category {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM site_categories sc \
                 JOIN categories c ON c.id = sc.category_id \
                 WHERE sc.site_id = s.id AND LOWER(c.name) = LOWER(",
            )
            .push_bind(category.clone())
            .push("))");
    }

    if let Some(tag) = &filter.tag {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM site_tags st \
                 JOIN tags t ON t.id = st.tag_id \
                 WHERE st.site_id = s.id AND LOWER(t.name) = LOWER(",
            )
            .push_bind(tag.clone())
            .push("))");
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

const SITE_COLUMNS: &str = "s.id, s.url, s.title, s.description, s.favicon_url, s.image_url, \
                            s.last_fetched_at, s.created_at, s.updated_at";

#[async_trait]
impl SiteRepositoryTrait for SiteRepository {
    async fn count(&self, filter: &SiteFilter) -> Result<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM sites s");
        push_filters(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, filter: &SiteFilter, offset: i64, limit: i64) -> Result<Vec<SiteRecord>> {
        let mut builder = QueryBuilder::new(format!("SELECT {SITE_COLUMNS} FROM sites s"));
        push_filters(&mut builder, filter);
        builder
            .push(" ORDER BY s.created_at DESC OFFSET ")
            .push_bind(offset)
            .push(" LIMIT ")
            .push_bind(limit);

        let sites: Vec<Site> = builder.build_query_as().fetch_all(&self.pool).await?;
        self.attach_labels(sites).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Site>> {
        let site = sqlx::query_as::<_, Site>(
            "SELECT id, url, title, description, favicon_url, image_url, \
             last_fetched_at, created_at, updated_at \
             FROM sites WHERE url = $1",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(site)
    }

    async fn create(&self, site: NewSite) -> Result<SiteRecord> {
        let mut tx = self.pool.begin().await?;

        let created: Site = sqlx::query_as(
            "INSERT INTO sites (url, title, description, favicon_url, image_url, last_fetched_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, url, title, description, favicon_url, image_url, \
             last_fetched_at, created_at, updated_at",
        )
        .bind(&site.url)
        .bind(&site.title)
        .bind(&site.description)
        .bind(&site.favicon_url)
        .bind(&site.image_url)
        .bind(site.last_fetched_at)
        .fetch_one(&mut *tx)
        .await?;

        for category_id in &site.category_ids {
            sqlx::query(
                "INSERT INTO site_categories (site_id, category_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        }

        for tag_id in &site.tag_ids {
            sqlx::query(
                "INSERT INTO site_tags (site_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut records = self.attach_labels(vec![created]).await?;
        records
            .pop()
            .ok_or_else(|| anyhow::anyhow!("created site disappeared"))
    }
}
