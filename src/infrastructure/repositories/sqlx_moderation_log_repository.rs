use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;

use crate::domain::moderation::verdict::{CheckKind, CheckOutcome, ModerationLogEntry, Verdict};
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::repository::ModerationLogRepository;

#[derive(FromRow)]
struct LogRow {
    id: i64,
    submission_id: i64,
    check_name: CheckKind,
    verdict: Verdict,
    score: f64,
    detail: String,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for ModerationLogEntry {
    fn from(r: LogRow) -> Self {
        ModerationLogEntry {
            id: r.id,
            submission_id: r.submission_id,
            check: r.check_name,
            verdict: r.verdict,
            score: r.score,
            detail: r.detail,
            created_at: r.created_at,
        }
    }
}

pub struct SqlxModerationLogRepository {
    pub pool: PgPool,
}

impl SqlxModerationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModerationLogRepository for SqlxModerationLogRepository {
    async fn append(
        &self,
        submission_id: i64,
        outcome: &CheckOutcome,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"INSERT INTO moderation_logs (submission_id, check_name, verdict, score, detail)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(submission_id)
        .bind(outcome.check)
        .bind(outcome.verdict)
        .bind(outcome.score)
        .bind(&outcome.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to append moderation log for {submission_id}: {e}");
            DomainError::Infrastructure(e.to_string())
        })?;
        Ok(())
    }

    async fn list_for_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<ModerationLogEntry>, DomainError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"SELECT id, submission_id, check_name, verdict, score, detail, created_at
               FROM moderation_logs
               WHERE submission_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(rows.into_iter().map(ModerationLogEntry::from).collect())
    }
}
