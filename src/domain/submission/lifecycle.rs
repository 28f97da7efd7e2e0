//! Submission lifecycle state machine.
//!
//! Every status change in the system flows through [`transition`], which
//! validates (current status, event) pairs against one central table instead
//! of scattering guard logic across handlers. Callers apply the returned
//! status; an illegal pair is a [`TransitionError`], never a silent no-op.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::settings::ModerationSettings;
use super::entity::PostType;

/// Moderation and publication status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting human review (or payment already settled for promos).
    #[default]
    Pending,

    /// Promotional post created, checkout not yet completed.
    PaymentPending,

    /// Cleared for publication, manually or via auto-publish policy.
    Approved,

    /// Terminal: hidden from all publication paths.
    Rejected,

    /// Moderation found reason to block automatic publication; needs a human.
    Flagged,

    /// Terminal: live on the external account.
    Published,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 6] = [
        Self::Pending,
        Self::PaymentPending,
        Self::Approved,
        Self::Rejected,
        Self::Flagged,
        Self::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PaymentPending => "payment_pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Flagged => "flagged",
            Self::Published => "published",
        }
    }

    /// Terminal states for the normal flow. `Flagged` is not terminal; it
    /// waits for human re-approval.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Rejected)
    }

    /// Whether a submission in this status keeps its image fingerprint live
    /// for duplicate detection. Rejected, flagged, and unpaid content can be
    /// resubmitted without tripping the duplicate check.
    pub fn is_live_for_duplicates(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::Published)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can move a submission between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Payment record reached terminal success. The policy flag decides
    /// whether the post returns to human review or goes straight to approved.
    PaymentCompleted { requires_review: bool },

    /// Checkout failed, expired or was cancelled; resubmission allowed.
    PaymentFailed,

    /// A moderation run ended with >=1 fail or >=3 warnings.
    ModerationFlagged,

    /// Manual admin approval (also the override path out of `Flagged`).
    AdminApproved,

    /// Manual admin rejection.
    AdminRejected,

    /// External publish call confirmed success.
    Published,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PaymentCompleted { .. } => "payment_completed",
            Self::PaymentFailed => "payment_failed",
            Self::ModerationFlagged => "moderation_flagged",
            Self::AdminApproved => "admin_approved",
            Self::AdminRejected => "admin_rejected",
            Self::Published => "published",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("event {event} is not legal in status {from}")]
    Rejected {
        from: SubmissionStatus,
        event: String,
    },
}

/// Computes the next status for `(from, event)`, or rejects the pair.
pub fn transition(
    from: SubmissionStatus,
    event: LifecycleEvent,
) -> Result<SubmissionStatus, TransitionError> {
    use LifecycleEvent as E;
    use SubmissionStatus as S;

    let next = match (from, event) {
        (S::PaymentPending, E::PaymentCompleted { requires_review }) => {
            if requires_review {
                S::Pending
            } else {
                S::Approved
            }
        }
        (S::PaymentPending, E::PaymentFailed) => S::Pending,

        // Moderation overrides whatever status triggered the run. A re-run on
        // an already flagged submission that still fails stays flagged, which
        // keeps runs idempotent.
        (S::Pending | S::PaymentPending | S::Approved | S::Flagged, E::ModerationFlagged) => {
            S::Flagged
        }

        (S::Pending | S::Flagged, E::AdminApproved) => S::Approved,
        (S::Pending | S::Flagged | S::Approved, E::AdminRejected) => S::Rejected,
        (S::Approved, E::Published) => S::Published,

        (from, event) => {
            return Err(TransitionError::Rejected {
                from,
                event: event.to_string(),
            });
        }
    };
    Ok(next)
}

/// Initial status of a freshly created submission.
///
/// Promotional posts always start in `PaymentPending`. Free posts start
/// `Approved` when the auto-publish policy holds (auto-publish on, approval
/// requirement off), otherwise `Pending`.
pub fn initial_status(post_type: PostType, settings: &ModerationSettings) -> SubmissionStatus {
    match post_type {
        PostType::Promotional => SubmissionStatus::PaymentPending,
        PostType::Free => {
            if settings.auto_publish && !settings.require_approval {
                SubmissionStatus::Approved
            } else {
                SubmissionStatus::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_completion_routes_by_review_policy() {
        assert_eq!(
            transition(
                SubmissionStatus::PaymentPending,
                LifecycleEvent::PaymentCompleted {
                    requires_review: true
                }
            ),
            Ok(SubmissionStatus::Pending)
        );
        assert_eq!(
            transition(
                SubmissionStatus::PaymentPending,
                LifecycleEvent::PaymentCompleted {
                    requires_review: false
                }
            ),
            Ok(SubmissionStatus::Approved)
        );
    }

    #[test]
    fn failed_payment_allows_resubmission() {
        assert_eq!(
            transition(SubmissionStatus::PaymentPending, LifecycleEvent::PaymentFailed),
            Ok(SubmissionStatus::Pending)
        );
    }

    #[test]
    fn moderation_flag_overrides_live_statuses() {
        for from in [
            SubmissionStatus::Pending,
            SubmissionStatus::PaymentPending,
            SubmissionStatus::Approved,
            SubmissionStatus::Flagged,
        ] {
            assert_eq!(
                transition(from, LifecycleEvent::ModerationFlagged),
                Ok(SubmissionStatus::Flagged)
            );
        }
    }

    #[test]
    fn moderation_flag_cannot_resurrect_terminal_statuses() {
        for from in [SubmissionStatus::Rejected, SubmissionStatus::Published] {
            assert!(transition(from, LifecycleEvent::ModerationFlagged).is_err());
        }
    }

    #[test]
    fn admin_can_override_a_flag() {
        assert_eq!(
            transition(SubmissionStatus::Flagged, LifecycleEvent::AdminApproved),
            Ok(SubmissionStatus::Approved)
        );
    }

    #[test]
    fn publish_requires_approved() {
        assert_eq!(
            transition(SubmissionStatus::Approved, LifecycleEvent::Published),
            Ok(SubmissionStatus::Published)
        );
        assert!(transition(SubmissionStatus::Pending, LifecycleEvent::Published).is_err());
        assert!(transition(SubmissionStatus::Flagged, LifecycleEvent::Published).is_err());
    }

    #[test]
    fn rejected_and_published_are_terminal() {
        assert!(SubmissionStatus::Rejected.is_terminal());
        assert!(SubmissionStatus::Published.is_terminal());
        assert!(!SubmissionStatus::Flagged.is_terminal());
        for event in [
            LifecycleEvent::AdminApproved,
            LifecycleEvent::Published,
            LifecycleEvent::PaymentFailed,
        ] {
            assert!(transition(SubmissionStatus::Rejected, event).is_err());
            assert!(transition(SubmissionStatus::Published, event).is_err());
        }
    }

    #[test]
    fn only_live_statuses_feed_duplicate_detection() {
        // The duplicate-check SQL binds exactly this set; rejected and
        // flagged rows must not block a resubmission.
        let live: Vec<SubmissionStatus> = SubmissionStatus::ALL
            .into_iter()
            .filter(|s| s.is_live_for_duplicates())
            .collect();
        assert_eq!(
            live,
            [
                SubmissionStatus::Pending,
                SubmissionStatus::Approved,
                SubmissionStatus::Published,
            ]
        );
        assert!(!SubmissionStatus::Rejected.is_live_for_duplicates());
        assert!(!SubmissionStatus::Flagged.is_live_for_duplicates());
        assert!(!SubmissionStatus::PaymentPending.is_live_for_duplicates());
    }

    #[test]
    fn initial_status_follows_type_and_policy() {
        let defaults = ModerationSettings::default();
        assert_eq!(
            initial_status(PostType::Promotional, &defaults),
            SubmissionStatus::PaymentPending
        );
        assert_eq!(
            initial_status(PostType::Free, &defaults),
            SubmissionStatus::Pending
        );

        let auto = ModerationSettings {
            auto_publish: true,
            require_approval: false,
            ..ModerationSettings::default()
        };
        assert_eq!(
            initial_status(PostType::Free, &auto),
            SubmissionStatus::Approved
        );

        let gated = ModerationSettings {
            auto_publish: true,
            require_approval: true,
            ..ModerationSettings::default()
        };
        assert_eq!(
            initial_status(PostType::Free, &gated),
            SubmissionStatus::Pending
        );
    }
}
