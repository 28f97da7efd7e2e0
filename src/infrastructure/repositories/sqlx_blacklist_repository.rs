use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::domain::moderation::blacklist::BlacklistEntry;
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::repository::BlacklistRepository;

const COLUMNS: &str = "id, keyword, category, is_active, created_at";

pub struct SqlxBlacklistRepository {
    pub pool: PgPool,
}

impl SqlxBlacklistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlacklistRepository for SqlxBlacklistRepository {
    async fn list_active(&self) -> Result<Vec<BlacklistEntry>, DomainError> {
        sqlx::query_as::<_, BlacklistEntry>(&format!(
            "SELECT {COLUMNS} FROM blacklisted_keywords WHERE is_active ORDER BY keyword"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, DomainError> {
        sqlx::query_as::<_, BlacklistEntry>(&format!(
            "SELECT {COLUMNS} FROM blacklisted_keywords ORDER BY keyword"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))
    }

    async fn add(&self, keyword: &str, category: &str) -> Result<BlacklistEntry, DomainError> {
        // Keywords are matched case-insensitively, so they are stored lowercased.
        let entry = sqlx::query_as::<_, BlacklistEntry>(&format!(
            r#"INSERT INTO blacklisted_keywords (keyword, category)
               VALUES (LOWER(TRIM($1)), $2)
               ON CONFLICT (keyword) DO UPDATE SET category = $2, is_active = TRUE
               RETURNING {COLUMNS}"#
        ))
        .bind(keyword)
        .bind(category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        info!("blacklisted keyword {} ({})", entry.keyword, entry.category);
        Ok(entry)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM blacklisted_keywords WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("blacklist entry {id}")));
        }
        Ok(())
    }

    async fn toggle(&self, id: i64) -> Result<bool, DomainError> {
        let active: Option<bool> = sqlx::query_scalar(
            "UPDATE blacklisted_keywords SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        active.ok_or_else(|| DomainError::NotFound(format!("blacklist entry {id}")))
    }
}
