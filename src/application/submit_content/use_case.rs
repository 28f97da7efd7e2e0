//! Submission intake.
//!
//! Validates the form, runs the pre-save quick check, stores media, creates
//! the submission, and kicks off the first moderation run. Promotional posts
//! additionally get a checkout session; free posts that come out approved may
//! auto-publish when the policy allows it.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::moderation::profanity::ProfanityLexicon;
use crate::domain::moderation::quick_check::quick_check;
use crate::domain::payment::NewPayment;
use crate::domain::settings::ModerationSettings;
use crate::domain::submission::entity::{NewSubmission, PostType, Submission};
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::lifecycle::{SubmissionStatus, initial_status};
use crate::domain::submission::repository::{
    BlacklistRepository, PaymentRepository, SubmissionRepository,
};
use crate::domain::submission::value_objects::Caption;
use crate::infrastructure::captioning::{CaptionGenerator, CaptionStyle};
use crate::infrastructure::payments::CheckoutProvider;
use crate::infrastructure::publishing::{PublishRequest, Publisher};
use crate::infrastructure::storage::traits::StorageService;
use super::dto::{MediaUpload, SubmitContentInput, SubmitContentOutput};
use crate::application::moderate_submission::ModerationEngine;
use crate::infrastructure::hashing::fingerprint_image;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi"];
const MAX_IMAGES: usize = 10;

pub struct SubmitContentUseCase {
    submissions: Arc<dyn SubmissionRepository>,
    payments: Arc<dyn PaymentRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
    engine: Arc<ModerationEngine>,
    storage: Arc<dyn StorageService>,
    publisher: Arc<dyn Publisher>,
    captioner: Arc<dyn CaptionGenerator>,
    checkout: Arc<dyn CheckoutProvider>,
    lexicon: Option<Box<dyn ProfanityLexicon>>,
    public_base_url: String,
}

impl SubmitContentUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        payments: Arc<dyn PaymentRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
        engine: Arc<ModerationEngine>,
        storage: Arc<dyn StorageService>,
        publisher: Arc<dyn Publisher>,
        captioner: Arc<dyn CaptionGenerator>,
        checkout: Arc<dyn CheckoutProvider>,
        lexicon: Option<Box<dyn ProfanityLexicon>>,
        public_base_url: String,
    ) -> Self {
        Self {
            submissions,
            payments,
            blacklist,
            engine,
            storage,
            publisher,
            captioner,
            checkout,
            lexicon,
            public_base_url,
        }
    }

    #[instrument(skip(self, input), fields(post_type = input.post_type.as_str(), images = input.images.len()))]
    pub async fn execute(
        &self,
        input: SubmitContentInput,
    ) -> Result<SubmitContentOutput, DomainError> {
        let caption = Caption::new(&input.caption)
            .map_err(|e| DomainError::Validation(format!("invalid caption: {e}")))?;
        validate_media(&input)?;
        if input.post_type == PostType::Promotional
            && input
                .submitter_email
                .as_deref()
                .is_none_or(|e| e.trim().is_empty())
        {
            return Err(DomainError::Validation(
                "an email address is required for promotional posts".into(),
            ));
        }

        // Hard-block check before anything is persisted. Reasons are already
        // submitter-safe.
        let blacklist = self.blacklist.list_active().await?;
        let verdict = quick_check(&caption.value, &blacklist, self.lexicon.as_deref());
        if verdict.flagged {
            return Err(DomainError::Validation(
                verdict.reason.unwrap_or_else(|| "content rejected".into()),
            ));
        }

        let settings = self.engine.settings_snapshot().await?;

        let cover = &input.images[0];
        let image_path = self.store_media("images", cover).await?;
        let mut extra_images = Vec::with_capacity(input.images.len() - 1);
        for upload in &input.images[1..] {
            extra_images.push(self.store_media("images", upload).await?);
        }
        let video_path = match &input.video {
            Some(video) => Some(self.store_media("videos", video).await?),
            None => None,
        };
        let fingerprint = fingerprint_image(&cover.data);
        if fingerprint.is_degraded() {
            warn!("cover image fingerprint degraded to content digest");
        }

        let status = initial_status(input.post_type, &settings);
        let submission = self
            .submissions
            .create(&NewSubmission {
                submitter_name: input.submitter_name.clone(),
                submitter_email: input.submitter_email.clone(),
                submitter_ip: input.submitter_ip.clone(),
                user_agent: input.user_agent.clone(),
                caption: caption.value.clone(),
                image_path,
                extra_images,
                video_path,
                image_hash: Some(fingerprint.hex),
                post_type: input.post_type,
                promo_amount_cents: if input.post_type == PostType::Promotional {
                    settings.promo_amount_cents
                } else {
                    0
                },
                status,
            })
            .await?;
        info!("submission {} created with status {status}", submission.id);

        // A failed run is not fatal to intake: the submission is saved and an
        // admin can re-run moderation. It does veto auto-publish below.
        let run = match self.engine.run(submission.id).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("moderation run failed for submission {}: {e}", submission.id);
                self.engine
                    .record_failure(submission.id, &format!("moderation run aborted: {e}"))
                    .await;
                None
            }
        };

        let mut checkout_url = None;
        let mut published = false;
        match input.post_type {
            PostType::Promotional => {
                checkout_url = Some(self.open_checkout(&submission, &settings).await?);
            }
            PostType::Free => {
                let clean_and_approved = run
                    .as_ref()
                    .is_some_and(|o| !o.flagged() && o.status == SubmissionStatus::Approved);
                if clean_and_approved && settings.auto_publish {
                    published = self.try_auto_publish(submission.id).await;
                }
            }
        }

        let submission = self
            .submissions
            .find_by_id(submission.id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("submission {}", submission.id)))?;
        Ok(SubmitContentOutput {
            submission,
            checkout_url,
            published,
        })
    }

    async fn store_media(&self, prefix: &str, upload: &MediaUpload) -> Result<String, DomainError> {
        let ext = extension(&upload.filename)
            .ok_or_else(|| DomainError::Validation("file has no extension".into()))?;
        let key = format!("{prefix}/{}.{ext}", Uuid::now_v7());
        self.storage.store(&key, upload.data.to_vec()).await
    }

    async fn open_checkout(
        &self,
        submission: &Submission,
        settings: &ModerationSettings,
    ) -> Result<String, DomainError> {
        if !self.checkout.is_configured() {
            return Err(DomainError::Validation(
                "promotional posts are currently unavailable".into(),
            ));
        }
        let session = self
            .checkout
            .create_session(
                submission.id,
                settings.promo_amount_cents,
                submission.submitter_email.as_deref(),
                &format!("{}/submit/success", self.public_base_url),
                &format!("{}/submit/cancelled", self.public_base_url),
            )
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;

        self.payments
            .create(&NewPayment {
                submission_id: submission.id,
                session_id: session.session_id,
                amount_cents: settings.promo_amount_cents,
                currency: "usd".into(),
            })
            .await?;
        Ok(session.checkout_url)
    }

    /// Best-effort automated publication: caption enhancement and publish
    /// failures are logged, never surfaced to the submitter.
    async fn try_auto_publish(&self, id: i64) -> bool {
        if !self.publisher.is_configured() {
            return false;
        }
        let Ok(Some(submission)) = self.submissions.find_by_id(id).await else {
            return false;
        };

        if self.captioner.is_configured() {
            if let Ok(cover) = self.storage.read(&submission.image_path).await {
                match self
                    .captioner
                    .generate(&cover, Some(&submission.original_caption), CaptionStyle::default())
                    .await
                {
                    Ok(caption) => {
                        if let Err(e) = self.submissions.update_caption(id, &caption).await {
                            warn!("generated caption not saved for {id}: {e}");
                        }
                    }
                    Err(e) => warn!("caption generation failed for {id}: {e}"),
                }
            }
        }

        match publish_submission(
            self.submissions.as_ref(),
            self.storage.as_ref(),
            self.publisher.as_ref(),
            id,
        )
        .await
        {
            Ok(()) => {
                info!("submission {id} auto-published");
                true
            }
            Err(e) => {
                warn!("auto-publish failed for submission {id}: {e}");
                false
            }
        }
    }
}

/// Reads stored media back, hands it to the publisher, and records success.
/// The submission keeps its current status when any step fails.
pub(crate) async fn publish_submission(
    submissions: &dyn SubmissionRepository,
    storage: &dyn StorageService,
    publisher: &dyn Publisher,
    id: i64,
) -> Result<(), DomainError> {
    let submission = submissions
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("submission {id}")))?;

    let image = storage.read(&submission.image_path).await?;
    let mut extra_images = Vec::with_capacity(submission.extra_images.len());
    for key in &submission.extra_images {
        extra_images.push(storage.read(key).await?);
    }
    let video = match &submission.video_path {
        Some(key) => Some(storage.read(key).await?),
        None => None,
    };

    let post = publisher
        .publish(PublishRequest {
            image,
            caption: submission.caption.clone(),
            extra_images,
            video,
        })
        .await
        .map_err(|e| DomainError::Publish(e.to_string()))?;

    submissions
        .mark_published(id, &post.post_id, post.media_url.as_deref())
        .await
}

fn validate_media(input: &SubmitContentInput) -> Result<(), DomainError> {
    if input.images.is_empty() {
        return Err(DomainError::Validation("at least one image is required".into()));
    }
    if input.images.len() > MAX_IMAGES {
        return Err(DomainError::Validation(format!(
            "at most {MAX_IMAGES} images are allowed"
        )));
    }
    for image in &input.images {
        let ext = extension(&image.filename);
        if !ext.as_deref().is_some_and(|e| IMAGE_EXTENSIONS.contains(&e)) {
            return Err(DomainError::Validation(format!(
                "unsupported image type: {}",
                image.filename
            )));
        }
        if image.data.is_empty() {
            return Err(DomainError::Validation(format!(
                "empty upload: {}",
                image.filename
            )));
        }
    }
    if let Some(video) = &input.video {
        let ext = extension(&video.filename);
        if !ext.as_deref().is_some_and(|e| VIDEO_EXTENSIONS.contains(&e)) {
            return Err(DomainError::Validation(format!(
                "unsupported video type: {}",
                video.filename
            )));
        }
    }
    Ok(())
}

fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}
