use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::domain::submission::errors::DomainError;
use crate::domain::submission::repository::SettingsRepository;

pub struct SqlxSettingsRepository {
    pub pool: PgPool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn all(&self) -> Result<Vec<(String, String)>, DomainError> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM system_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"INSERT INTO system_settings (key, value)
               VALUES ($1, $2)
               ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        info!("setting {key} = {value}");
        Ok(())
    }
}
