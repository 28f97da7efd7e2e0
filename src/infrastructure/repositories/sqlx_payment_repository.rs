use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};

use crate::domain::payment::{NewPayment, PaymentRecord, PaymentStatus};
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::repository::PaymentRepository;

const COLUMNS: &str = "id, submission_id, session_id, payment_intent_id, charge_id, \
     amount_cents, currency, status, payer_email, created_at, updated_at";

#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    submission_id: i64,
    session_id: Option<String>,
    payment_intent_id: Option<String>,
    charge_id: Option<String>,
    amount_cents: i64,
    currency: String,
    status: PaymentStatus,
    payer_email: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(r: PaymentRow) -> Self {
        PaymentRecord {
            id: r.id,
            submission_id: r.submission_id,
            session_id: r.session_id,
            payment_intent_id: r.payment_intent_id,
            charge_id: r.charge_id,
            amount_cents: r.amount_cents,
            currency: r.currency,
            status: r.status,
            payer_email: r.payer_email,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub struct SqlxPaymentRepository {
    pub pool: PgPool,
}

impl SqlxPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlxPaymentRepository {
    async fn create(&self, payment: &NewPayment) -> Result<PaymentRecord, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"INSERT INTO payments (submission_id, session_id, amount_cents, currency)
               VALUES ($1, $2, $3, $4)
               RETURNING {COLUMNS}"#
        ))
        .bind(payment.submission_id)
        .bind(&payment.session_id)
        .bind(payment.amount_cents)
        .bind(&payment.currency)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create payment for submission {}: {e}", payment.submission_id);
            DomainError::Infrastructure(e.to_string())
        })?;

        info!("created payment {} for submission {}", row.id, row.submission_id);
        Ok(row.into())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {COLUMNS} FROM payments WHERE session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(row.map(PaymentRecord::from))
    }

    async fn find_by_charge(
        &self,
        charge_id: &str,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {COLUMNS} FROM payments WHERE charge_id = $1 OR payment_intent_id = $1"
        ))
        .bind(charge_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(row.map(PaymentRecord::from))
    }

    async fn find_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Option<PaymentRecord>, DomainError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {COLUMNS} FROM payments WHERE submission_id = $1 ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(row.map(PaymentRecord::from))
    }

    async fn set_status<'a>(
        &self,
        id: i64,
        status: PaymentStatus,
        payment_intent_id: Option<&'a str>,
        payer_email: Option<&'a str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"UPDATE payments
               SET status = $2,
                   payment_intent_id = COALESCE($3, payment_intent_id),
                   payer_email = COALESCE($4, payer_email),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(status)
        .bind(payment_intent_id)
        .bind(payer_email)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("payment {id}")));
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PaymentRecord>, DomainError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"SELECT {COLUMNS} FROM payments
               ORDER BY created_at DESC
               LIMIT $1 OFFSET $2"#
        ))
        .bind(limit.clamp(1, 200))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(rows.into_iter().map(PaymentRecord::from).collect())
    }

    async fn completed_total_cents(&self) -> Result<i64, DomainError> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE status = 'completed'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(total.unwrap_or(0))
    }
}
