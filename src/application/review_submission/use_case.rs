//! Admin review actions: approve, reject, publish, re-run moderation, and
//! caption regeneration. Every status change goes through the lifecycle
//! table; an illegal action surfaces as a transition error, never a silent
//! overwrite.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::submission::entity::Submission;
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::lifecycle::{LifecycleEvent, transition};
use crate::domain::submission::repository::{PaymentRepository, SubmissionRepository};
use crate::domain::submission::value_objects::Caption;
use crate::infrastructure::captioning::{CaptionError, CaptionGenerator, CaptionStyle};
use crate::infrastructure::publishing::Publisher;
use crate::infrastructure::storage::traits::StorageService;
use crate::application::moderate_submission::{ModerationEngine, ModerationRunOutcome};
use crate::application::submit_content::use_case::publish_submission;

pub struct ReviewSubmissionUseCase {
    submissions: Arc<dyn SubmissionRepository>,
    payments: Arc<dyn PaymentRepository>,
    engine: Arc<ModerationEngine>,
    storage: Arc<dyn StorageService>,
    publisher: Arc<dyn Publisher>,
    captioner: Arc<dyn CaptionGenerator>,
}

impl ReviewSubmissionUseCase {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        payments: Arc<dyn PaymentRepository>,
        engine: Arc<ModerationEngine>,
        storage: Arc<dyn StorageService>,
        publisher: Arc<dyn Publisher>,
        captioner: Arc<dyn CaptionGenerator>,
    ) -> Self {
        Self {
            submissions,
            payments,
            engine,
            storage,
            publisher,
            captioner,
        }
    }

    async fn load(&self, id: i64) -> Result<Submission, DomainError> {
        self.submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("submission {id}")))
    }

    /// Approves a submission, optionally replacing the working caption with
    /// an admin edit first.
    #[instrument(skip(self, edited_caption))]
    pub async fn approve(
        &self,
        id: i64,
        reviewer: &str,
        edited_caption: Option<&str>,
    ) -> Result<Submission, DomainError> {
        let submission = self.load(id).await?;
        let next = transition(submission.status, LifecycleEvent::AdminApproved)?;

        if let Some(edit) = edited_caption {
            let caption = Caption::new(edit)
                .map_err(|e| DomainError::Validation(format!("invalid caption: {e}")))?;
            self.submissions.update_caption(id, &caption.value).await?;
        }
        self.submissions.set_status(id, next, Some(reviewer)).await?;
        info!("submission {id} approved by {reviewer}");
        self.load(id).await
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, id: i64, reviewer: &str) -> Result<Submission, DomainError> {
        let submission = self.load(id).await?;
        let next = transition(submission.status, LifecycleEvent::AdminRejected)?;
        self.submissions.set_status(id, next, Some(reviewer)).await?;
        info!("submission {id} rejected by {reviewer}");
        self.load(id).await
    }

    /// Publishes an approved submission. Promotional posts must have a
    /// completed payment. The status is only advanced after the external
    /// call succeeds, so a failed publish leaves the submission approved.
    #[instrument(skip(self))]
    pub async fn publish(&self, id: i64) -> Result<Submission, DomainError> {
        let submission = self.load(id).await?;
        let payment = self.payments.find_by_submission(id).await?;
        if !submission.is_publishable(payment.as_ref()) {
            return Err(DomainError::Validation(format!(
                "submission {id} is not publishable (status {}, {})",
                submission.status,
                if submission.is_promotional() {
                    "payment incomplete"
                } else {
                    "free post"
                }
            )));
        }
        if !self.publisher.is_configured() {
            return Err(DomainError::Publish("publisher not configured".into()));
        }

        publish_submission(
            self.submissions.as_ref(),
            self.storage.as_ref(),
            self.publisher.as_ref(),
            id,
        )
        .await?;
        self.load(id).await
    }

    /// Re-runs the full moderation pipeline on demand.
    pub async fn rerun_moderation(&self, id: i64) -> Result<ModerationRunOutcome, DomainError> {
        self.engine.run(id).await
    }

    /// Generates a fresh caption in the requested style and stores it as the
    /// working caption. The original caption is kept untouched.
    #[instrument(skip(self))]
    pub async fn generate_caption(
        &self,
        id: i64,
        style: CaptionStyle,
    ) -> Result<String, DomainError> {
        if !self.captioner.is_configured() {
            return Err(DomainError::Validation(
                "caption generation is not configured".into(),
            ));
        }
        let submission = self.load(id).await?;
        let cover = self.storage.read(&submission.image_path).await?;
        let caption = self
            .captioner
            .generate(&cover, Some(&submission.original_caption), style)
            .await
            .map_err(|e| match e {
                CaptionError::NotConfigured => {
                    DomainError::Validation("caption generation is not configured".into())
                }
                other => DomainError::Infrastructure(other.to_string()),
            })?;

        if let Err(e) = self.submissions.update_caption(id, &caption).await {
            warn!("generated caption not saved for {id}: {e}");
            return Err(e);
        }
        Ok(caption)
    }
}
