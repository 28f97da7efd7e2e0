use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::moderation::verdict::CheckOutcome;
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use super::lifecycle::SubmissionStatus;

/// Core domain entity: one piece of user-submitted content.
///
/// A submission enters through the public form, runs through the moderation
/// pipeline synchronously, and then waits for payment, human review, or
/// automated publication depending on its type and the system policy.
///
/// # Lifecycle
/// 1. **PaymentPending**: promotional posts, until checkout settles
/// 2. **Pending**: awaiting human review
/// 3. **Approved**: publishable (promos additionally need a completed payment)
/// 4. **Flagged**: moderation blocked it; needs admin override
/// 5. **Rejected** / **Published**: terminal
///
/// # Invariants
/// - `image_hash` is set only for images that came from a user upload, so
///   duplicate detection never compares generated content
/// - `promo_amount_cents` is nonzero only for promotional posts
/// - `moderation_flags` mirrors the persisted moderation log rows for the
///   latest run, so the audit trail survives independent of the log table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier, assigned by the database
    pub id: i64,

    /// Optional submitter display name
    pub submitter_name: Option<String>,

    /// Submitter email; required for promotional posts (payment tracking)
    pub submitter_email: Option<String>,

    /// Client IP at submission time, for abuse handling
    pub submitter_ip: Option<String>,

    /// Client user agent at submission time
    pub user_agent: Option<String>,

    /// Caption as it will be published (may be AI-edited)
    pub caption: String,

    /// Caption exactly as submitted, never mutated after creation
    pub original_caption: String,

    /// Storage key of the cover image
    pub image_path: String,

    /// Storage keys of additional carousel images, in display order
    pub extra_images: Vec<String>,

    /// Storage key of an optional video
    pub video_path: Option<String>,

    /// Perceptual fingerprint of the cover image (hex), when available
    pub image_hash: Option<String>,

    /// Free or promotional
    pub post_type: PostType,

    /// Price paid for a promotional post, in cents; zero for free posts
    pub promo_amount_cents: i64,

    /// Current lifecycle status
    pub status: SubmissionStatus,

    /// Aggregate moderation score of the latest run (higher = worse)
    pub moderation_score: f64,

    /// Structured per-check results of the latest moderation run
    pub moderation_flags: Vec<CheckOutcome>,

    /// Admin identity that manually approved or rejected this submission
    pub reviewed_by: Option<String>,

    /// External post identifier, set on successful publication
    pub external_post_id: Option<String>,

    /// Publicly hosted media URL used during publication
    pub external_media_url: Option<String>,

    /// When the post went live externally
    pub published_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn is_promotional(&self) -> bool {
        self.post_type == PostType::Promotional
    }

    /// Publishable predicate: free posts need `Approved`; promotional posts
    /// additionally need a linked payment in terminal success.
    pub fn is_publishable(&self, payment: Option<&PaymentRecord>) -> bool {
        if self.status != SubmissionStatus::Approved {
            return false;
        }
        match self.post_type {
            PostType::Free => true,
            PostType::Promotional => {
                payment.is_some_and(|p| p.status == PaymentStatus::Completed)
            }
        }
    }
}

/// Classification of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    #[default]
    Free,
    Promotional,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Promotional => "promotional",
        }
    }

    /// Parses a form value, defaulting unknown input to `Free`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "promotional" | "promo" => Self::Promotional,
            _ => Self::Free,
        }
    }
}

/// Insert payload for a new submission. The database assigns id and
/// timestamps; moderation fields start empty.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_ip: Option<String>,
    pub user_agent: Option<String>,
    pub caption: String,
    pub image_path: String,
    pub extra_images: Vec<String>,
    pub video_path: Option<String>,
    pub image_hash: Option<String>,
    pub post_type: PostType,
    pub promo_amount_cents: i64,
    pub status: SubmissionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentRecord;
    use chrono::Utc;

    fn submission(post_type: PostType, status: SubmissionStatus) -> Submission {
        Submission {
            id: 1,
            submitter_name: None,
            submitter_email: None,
            submitter_ip: None,
            user_agent: None,
            caption: "a caption".into(),
            original_caption: "a caption".into(),
            image_path: "images/a.jpg".into(),
            extra_images: vec![],
            video_path: None,
            image_hash: None,
            post_type,
            promo_amount_cents: 0,
            status,
            moderation_score: 0.0,
            moderation_flags: vec![],
            reviewed_by: None,
            external_post_id: None,
            external_media_url: None,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment(status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: 7,
            submission_id: 1,
            session_id: Some("cs_test".into()),
            payment_intent_id: None,
            charge_id: None,
            amount_cents: 200,
            currency: "usd".into(),
            status,
            payer_email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn free_post_publishable_when_approved() {
        let s = submission(PostType::Free, SubmissionStatus::Approved);
        assert!(s.is_publishable(None));
        let s = submission(PostType::Free, SubmissionStatus::Pending);
        assert!(!s.is_publishable(None));
    }

    #[test]
    fn promotional_post_needs_completed_payment() {
        let s = submission(PostType::Promotional, SubmissionStatus::Approved);
        assert!(!s.is_publishable(None));
        assert!(!s.is_publishable(Some(&payment(PaymentStatus::Pending))));
        assert!(s.is_publishable(Some(&payment(PaymentStatus::Completed))));
    }

    #[test]
    fn post_type_parses_leniently() {
        assert_eq!(PostType::parse_lenient("promotional"), PostType::Promotional);
        assert_eq!(PostType::parse_lenient("FREE"), PostType::Free);
        assert_eq!(PostType::parse_lenient("???"), PostType::Free);
    }
}
