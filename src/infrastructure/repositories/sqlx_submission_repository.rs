use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info, instrument};

use crate::domain::moderation::verdict::CheckOutcome;
use crate::domain::submission::entity::{NewSubmission, PostType, Submission};
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::lifecycle::SubmissionStatus;
use crate::domain::submission::repository::SubmissionRepository;

const COLUMNS: &str = "id, submitter_name, submitter_email, submitter_ip, user_agent, \
     caption, original_caption, image_path, extra_images, video_path, image_hash, \
     post_type, promo_amount_cents, status, moderation_score, moderation_flags, \
     reviewed_by, external_post_id, external_media_url, published_at, created_at, updated_at";

#[derive(FromRow)]
struct SubmissionRow {
    id: i64,
    submitter_name: Option<String>,
    submitter_email: Option<String>,
    submitter_ip: Option<String>,
    user_agent: Option<String>,
    caption: String,
    original_caption: String,
    image_path: String,
    extra_images: serde_json::Value,
    video_path: Option<String>,
    image_hash: Option<String>,
    post_type: PostType,
    promo_amount_cents: i64,
    status: SubmissionStatus,
    moderation_score: f64,
    moderation_flags: serde_json::Value,
    reviewed_by: Option<String>,
    external_post_id: Option<String>,
    external_media_url: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubmissionRow> for Submission {
    fn from(r: SubmissionRow) -> Self {
        Submission {
            id: r.id,
            submitter_name: r.submitter_name,
            submitter_email: r.submitter_email,
            submitter_ip: r.submitter_ip,
            user_agent: r.user_agent,
            caption: r.caption,
            original_caption: r.original_caption,
            image_path: r.image_path,
            extra_images: serde_json::from_value(r.extra_images).unwrap_or_default(),
            video_path: r.video_path,
            image_hash: r.image_hash,
            post_type: r.post_type,
            promo_amount_cents: r.promo_amount_cents,
            status: r.status,
            moderation_score: r.moderation_score,
            moderation_flags: serde_json::from_value(r.moderation_flags).unwrap_or_default(),
            reviewed_by: r.reviewed_by,
            external_post_id: r.external_post_id,
            external_media_url: r.external_media_url,
            published_at: r.published_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub struct SqlxSubmissionRepository {
    pub pool: PgPool,
}

impl SqlxSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for SqlxSubmissionRepository {
    #[instrument(skip(self, submission), fields(post_type = submission.post_type.as_str()))]
    async fn create(&self, submission: &NewSubmission) -> Result<Submission, DomainError> {
        let extra_images = serde_json::to_value(&submission.extra_images)
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"INSERT INTO submissions
                   (submitter_name, submitter_email, submitter_ip, user_agent,
                    caption, original_caption, image_path, extra_images, video_path,
                    image_hash, post_type, promo_amount_cents, status)
               VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING {COLUMNS}"#
        ))
        .bind(&submission.submitter_name)
        .bind(&submission.submitter_email)
        .bind(&submission.submitter_ip)
        .bind(&submission.user_agent)
        .bind(&submission.caption)
        .bind(&submission.image_path)
        .bind(extra_images)
        .bind(&submission.video_path)
        .bind(&submission.image_hash)
        .bind(submission.post_type)
        .bind(submission.promo_amount_cents)
        .bind(submission.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create submission: {e}");
            DomainError::Infrastructure(format!("failed to create submission: {e}"))
        })?;

        info!("created submission {}", row.id);
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Submission>, DomainError> {
        let row = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {COLUMNS} FROM submissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(row.map(Submission::from))
    }

    async fn list_by_status(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, DomainError> {
        let safe_limit = limit.clamp(1, 200);
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"SELECT {COLUMNS} FROM submissions
               WHERE ($1::text IS NULL OR status = $1)
               ORDER BY created_at DESC
               LIMIT $2 OFFSET $3"#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(safe_limit)
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        debug!("listed {} submissions", rows.len());
        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn list_published(&self, limit: i64) -> Result<Vec<Submission>, DomainError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            r#"SELECT {COLUMNS} FROM submissions
               WHERE status = 'published'
               ORDER BY published_at DESC NULLS LAST
               LIMIT $1"#
        ))
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn update_caption(&self, id: i64, caption: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE submissions SET caption = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(caption)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("submission {id}")));
        }
        Ok(())
    }

    async fn set_status<'a>(
        &self,
        id: i64,
        status: SubmissionStatus,
        reviewed_by: Option<&'a str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"UPDATE submissions
               SET status = $2,
                   reviewed_by = COALESCE($3, reviewed_by),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewed_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to set status of submission {id}: {e}");
            DomainError::Infrastructure(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("submission {id}")));
        }
        info!("submission {id} status set to {}", status.as_str());
        Ok(())
    }

    #[instrument(skip(self, flags), fields(flag_count = flags.len()))]
    async fn store_moderation_outcome(
        &self,
        id: i64,
        score: f64,
        flags: &[CheckOutcome],
        status: SubmissionStatus,
    ) -> Result<(), DomainError> {
        let flags = serde_json::to_value(flags)
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        let result = sqlx::query(
            r#"UPDATE submissions
               SET moderation_score = $2,
                   moderation_flags = $3,
                   status = $4,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(score)
        .bind(flags)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("submission {id}")));
        }
        Ok(())
    }

    async fn mark_published<'a>(
        &self,
        id: i64,
        external_post_id: &str,
        external_media_url: Option<&'a str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"UPDATE submissions
               SET status = 'published',
                   external_post_id = $2,
                   external_media_url = $3,
                   published_at = NOW(),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(external_post_id)
        .bind(external_media_url)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("submission {id}")));
        }
        info!("submission {id} published as {external_post_id}");
        Ok(())
    }

    async fn find_live_duplicate(
        &self,
        image_hash: &str,
        exclude_id: i64,
    ) -> Result<Option<i64>, DomainError> {
        let live: Vec<String> = SubmissionStatus::ALL
            .iter()
            .filter(|s| s.is_live_for_duplicates())
            .map(|s| s.as_str().to_string())
            .collect();
        let id: Option<i64> = sqlx::query_scalar(
            r#"SELECT id FROM submissions
               WHERE image_hash = $1
                 AND id <> $2
                 AND status = ANY($3)
               ORDER BY created_at ASC
               LIMIT 1"#,
        )
        .bind(image_hash)
        .bind(exclude_id)
        .bind(&live)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(id)
    }

    async fn status_counts(&self) -> Result<Vec<(SubmissionStatus, i64)>, DomainError> {
        let rows: Vec<(SubmissionStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM submissions GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(rows)
    }
}
