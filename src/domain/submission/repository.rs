//! Persistence traits consumed by the use cases.
//!
//! Implementations live under `infrastructure::repositories`; the engine and
//! use-case tests substitute mockall doubles so the pipeline runs without a
//! database.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::moderation::blacklist::BlacklistEntry;
use crate::domain::moderation::verdict::{CheckOutcome, ModerationLogEntry};
use crate::domain::payment::{NewPayment, PaymentRecord, PaymentStatus};
use super::entity::{NewSubmission, Submission};
use super::errors::DomainError;
use super::lifecycle::SubmissionStatus;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create(&self, submission: &NewSubmission) -> Result<Submission, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Submission>, DomainError>;

    async fn list_by_status(
        &self,
        status: Option<SubmissionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, DomainError>;

    async fn list_published(&self, limit: i64) -> Result<Vec<Submission>, DomainError>;

    /// Replaces the working caption; `original_caption` is never touched.
    async fn update_caption(&self, id: i64, caption: &str) -> Result<(), DomainError>;

    async fn set_status<'a>(
        &self,
        id: i64,
        status: SubmissionStatus,
        reviewed_by: Option<&'a str>,
    ) -> Result<(), DomainError>;

    /// Persists the summarized result of one moderation run: aggregate score,
    /// the structured per-check outcome list, and the post-run status.
    async fn store_moderation_outcome(
        &self,
        id: i64,
        score: f64,
        flags: &[CheckOutcome],
        status: SubmissionStatus,
    ) -> Result<(), DomainError>;

    /// Records a successful external publication.
    async fn mark_published<'a>(
        &self,
        id: i64,
        external_post_id: &str,
        external_media_url: Option<&'a str>,
    ) -> Result<(), DomainError>;

    /// Finds another submission with the same image hash whose status keeps
    /// it "live" in the pipeline (approved, published or pending).
    async fn find_live_duplicate(
        &self,
        image_hash: &str,
        exclude_id: i64,
    ) -> Result<Option<i64>, DomainError>;

    async fn status_counts(&self) -> Result<Vec<(SubmissionStatus, i64)>, DomainError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ModerationLogRepository: Send + Sync {
    /// Appends one audit row. Rows are immutable once written.
    async fn append(
        &self,
        submission_id: i64,
        outcome: &CheckOutcome,
    ) -> Result<(), DomainError>;

    async fn list_for_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<ModerationLogEntry>, DomainError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlacklistRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<BlacklistEntry>, DomainError>;

    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, DomainError>;

    async fn add(&self, keyword: &str, category: &str) -> Result<BlacklistEntry, DomainError>;

    async fn delete(&self, id: i64) -> Result<(), DomainError>;

    /// Flips the active flag and returns the new value.
    async fn toggle(&self, id: i64) -> Result<bool, DomainError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// All persisted key/value pairs; callers fold them into a
    /// `ModerationSettings` snapshot.
    async fn all(&self) -> Result<Vec<(String, String)>, DomainError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: &NewPayment) -> Result<PaymentRecord, DomainError>;

    async fn find_by_session(&self, session_id: &str)
        -> Result<Option<PaymentRecord>, DomainError>;

    async fn find_by_charge(&self, charge_id: &str)
        -> Result<Option<PaymentRecord>, DomainError>;

    async fn find_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Option<PaymentRecord>, DomainError>;

    async fn set_status<'a>(
        &self,
        id: i64,
        status: PaymentStatus,
        payment_intent_id: Option<&'a str>,
        payer_email: Option<&'a str>,
    ) -> Result<(), DomainError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PaymentRecord>, DomainError>;

    /// Sum of all completed payment amounts, in cents.
    async fn completed_total_cents(&self) -> Result<i64, DomainError>;
}
