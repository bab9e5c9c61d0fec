use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::entities::{Label, LabelKind, LabelWithCount};
use crate::repositories::is_unique_violation;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelRepositoryTrait {
    /// Case-insensitive name lookup, with the derived site count attached.
    async fn find_by_name(&self, kind: LabelKind, name: &str) -> Result<Option<LabelWithCount>>;
    /// Insert a new label. Fails with a unique violation when the name is
    /// already taken (case-insensitively).
    async fn create(&self, kind: LabelKind, name: &str) -> Result<Label>;
    /// Resolve a name to a label row, creating it on first use. Loses a
    /// creation race gracefully by re-reading the winner's row.
    async fn ensure(&self, kind: LabelKind, name: &str) -> Result<Label>;
    /// All label names, ascending.
    async fn list_names(&self, kind: LabelKind) -> Result<Vec<String>>;
    /// All labels with their site counts, ordered by name ascending.
    async fn list_with_counts(&self, kind: LabelKind) -> Result<Vec<LabelWithCount>>;
}

#[derive(Clone)]
pub struct LabelRepository {
    pool: PgPool,
}

impl LabelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_row(&self, kind: LabelKind, name: &str) -> Result<Option<Label>> {
        let sql = format!(
            "SELECT id, name, created_at FROM {table} WHERE LOWER(name) = LOWER($1)",
            table = kind.table(),
        );
        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(label)
    }
}

#[async_trait]
impl LabelRepositoryTrait for LabelRepository {
    async fn find_by_name(&self, kind: LabelKind, name: &str) -> Result<Option<LabelWithCount>> {
        let sql = format!(
            "SELECT l.id, l.name, COUNT(j.site_id) AS site_count \
             FROM {table} l \
             LEFT JOIN {join} j ON j.{column} = l.id \
             WHERE LOWER(l.name) = LOWER($1) \
             GROUP BY l.id, l.name",
            table = kind.table(),
            join = kind.join_table(),
            column = kind.join_column(),
        );
        let label = sqlx::query_as::<_, LabelWithCount>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(label)
    }

    async fn create(&self, kind: LabelKind, name: &str) -> Result<Label> {
        let sql = format!(
            "INSERT INTO {table} (name) VALUES ($1) RETURNING id, name, created_at",
            table = kind.table(),
        );
        let label = sqlx::query_as::<_, Label>(&sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(label)
    }

    async fn ensure(&self, kind: LabelKind, name: &str) -> Result<Label> {
        if let Some(existing) = self.find_row(kind, name).await? {
            return Ok(existing);
        }
        match self.create(kind, name).await {
            Ok(label) => Ok(label),
            // Concurrent creation of the same name: the unique index on
            // LOWER(name) rejects the loser, who adopts the winner's row.
            Err(err) if is_unique_violation(&err) => self
                .find_row(kind, name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("{} '{}' vanished after conflict", kind.noun(), name)),
            Err(err) => Err(err),
        }
    }

    async fn list_names(&self, kind: LabelKind) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT name FROM {table} ORDER BY name ASC",
            table = kind.table(),
        );
        let names: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(names)
    }

    async fn list_with_counts(&self, kind: LabelKind) -> Result<Vec<LabelWithCount>> {
        let sql = format!(
            "SELECT l.id, l.name, COUNT(j.site_id) AS site_count \
             FROM {table} l \
             LEFT JOIN {join} j ON j.{column} = l.id \
             GROUP BY l.id, l.name \
             ORDER BY l.name ASC",
            table = kind.table(),
            join = kind.join_table(),
            column = kind.join_column(),
        );
        let labels = sqlx::query_as::<_, LabelWithCount>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(labels)
    }
}
