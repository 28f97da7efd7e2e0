//! The moderation engine: one full check run against a stored submission.
//!
//! A run is strictly phased. All reads happen first (submission, settings
//! snapshot, active blacklist, duplicate candidate), then the pure check
//! registry runs, then all writes happen (audit log rows, aggregate outcome,
//! status transition). An in-process guard keeps at most one run in flight
//! per submission; a second caller gets a typed conflict instead of racing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{info, instrument, warn};

use crate::domain::moderation::checks::{CheckContext, run_registry};
use crate::domain::moderation::profanity::ProfanityLexicon;
use crate::domain::moderation::verdict::{CheckKind, CheckOutcome, ModerationReport};
use crate::domain::settings::ModerationSettings;
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::lifecycle::{LifecycleEvent, SubmissionStatus, transition};
use crate::domain::submission::repository::{
    BlacklistRepository, ModerationLogRepository, SettingsRepository, SubmissionRepository,
};

/// What one finished run produced.
#[derive(Debug, Clone)]
pub struct ModerationRunOutcome {
    pub report: ModerationReport,
    /// Submission status after the run was applied.
    pub status: SubmissionStatus,
}

impl ModerationRunOutcome {
    pub fn flagged(&self) -> bool {
        self.report.flagged()
    }
}

pub struct ModerationEngine {
    submissions: Arc<dyn SubmissionRepository>,
    logs: Arc<dyn ModerationLogRepository>,
    blacklist: Arc<dyn BlacklistRepository>,
    settings: Arc<dyn SettingsRepository>,
    lexicon: Option<Box<dyn ProfanityLexicon>>,
    in_flight: Mutex<HashSet<i64>>,
}

impl ModerationEngine {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        logs: Arc<dyn ModerationLogRepository>,
        blacklist: Arc<dyn BlacklistRepository>,
        settings: Arc<dyn SettingsRepository>,
        lexicon: Option<Box<dyn ProfanityLexicon>>,
    ) -> Self {
        Self {
            submissions,
            logs,
            blacklist,
            settings,
            lexicon,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Reads the current settings rows into an immutable snapshot.
    pub async fn settings_snapshot(&self) -> Result<ModerationSettings, DomainError> {
        Ok(ModerationSettings::from_pairs(self.settings.all().await?))
    }

    /// Runs the full check registry against submission `id` and persists the
    /// result. Returns a conflict error when a run for the same id is already
    /// in flight.
    #[instrument(skip(self))]
    pub async fn run(&self, id: i64) -> Result<ModerationRunOutcome, DomainError> {
        let _guard = RunGuard::acquire(&self.in_flight, id)?;

        let submission = self
            .submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("submission {id}")))?;
        let settings = self.settings_snapshot().await?;
        let blacklist = self.blacklist.list_active().await?;
        let duplicate_of = match submission.image_hash.as_deref() {
            Some(hash) => self.submissions.find_live_duplicate(hash, id).await?,
            None => None,
        };

        let ctx = CheckContext {
            caption: &submission.caption,
            image_hash: submission.image_hash.as_deref(),
            duplicate_of,
        };
        let report = ModerationReport::new(run_registry(
            &ctx,
            &settings,
            &blacklist,
            self.lexicon.as_deref(),
        ));

        for outcome in &report.outcomes {
            self.logs.append(id, outcome).await?;
        }

        let status = if report.flagged() {
            match transition(submission.status, LifecycleEvent::ModerationFlagged) {
                Ok(next) => next,
                Err(e) => {
                    // Terminal submissions keep their status; the audit rows
                    // above still record what the run found.
                    warn!("submission {id}: {e}");
                    submission.status
                }
            }
        } else {
            submission.status
        };

        self.submissions
            .store_moderation_outcome(id, report.score(), &report.outcomes, status)
            .await?;

        info!(
            "moderation run for {id}: score {:.1}, {} fail(s), {} warning(s), status {status}",
            report.score(),
            report.fails(),
            report.warnings(),
        );
        Ok(ModerationRunOutcome { report, status })
    }

    /// Writes a `system` fail row for a run that aborted before producing a
    /// report, so the audit trail shows the gap instead of silence.
    pub async fn record_failure(&self, id: i64, detail: &str) {
        let outcome = CheckOutcome::fail(CheckKind::System, detail);
        if let Err(e) = self.logs.append(id, &outcome).await {
            warn!("could not record moderation failure for {id}: {e}");
        }
    }
}

/// Removes the id from the in-flight set when the run ends, however it ends.
struct RunGuard<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    id: i64,
}

impl<'a> RunGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<i64>>, id: i64) -> Result<Self, DomainError> {
        let mut set = in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if !set.insert(id) {
            return Err(DomainError::ModerationInProgress(id));
        }
        Ok(Self { in_flight, id })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        set.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moderation::verdict::Verdict;
    use crate::domain::submission::entity::{PostType, Submission};
    use crate::domain::submission::repository::{
        MockBlacklistRepository, MockModerationLogRepository, MockSettingsRepository,
        MockSubmissionRepository,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    fn stored(id: i64, caption: &str, status: SubmissionStatus) -> Submission {
        Submission {
            id,
            submitter_name: None,
            submitter_email: None,
            submitter_ip: None,
            user_agent: None,
            caption: caption.into(),
            original_caption: caption.into(),
            image_path: "images/a.jpg".into(),
            extra_images: vec![],
            video_path: None,
            image_hash: None,
            post_type: PostType::Free,
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

    fn engine(
        submissions: MockSubmissionRepository,
        logs: MockModerationLogRepository,
    ) -> ModerationEngine {
        let mut blacklist = MockBlacklistRepository::new();
        blacklist.expect_list_active().returning(|| Ok(vec![]));
        let mut settings = MockSettingsRepository::new();
        settings.expect_all().returning(|| Ok(vec![]));
        ModerationEngine::new(
            Arc::new(submissions),
            Arc::new(logs),
            Arc::new(blacklist),
            Arc::new(settings),
            None,
        )
    }

    #[tokio::test]
    async fn clean_run_keeps_status_and_persists_outcome() {
        let mut submissions = MockSubmissionRepository::new();
        submissions
            .expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(stored(1, "a lovely evening by the water", SubmissionStatus::Pending))));
        submissions
            .expect_store_moderation_outcome()
            .withf(|id, score, flags, status| {
                *id == 1 && *score == 0.0 && flags.len() == 7 && *status == SubmissionStatus::Pending
            })
            .returning(|_, _, _, _| Ok(()));

        let mut logs = MockModerationLogRepository::new();
        logs.expect_append().times(7).returning(|_, _| Ok(()));

        let outcome = engine(submissions, logs).run(1).await.unwrap();
        assert!(!outcome.flagged());
        assert_eq!(outcome.status, SubmissionStatus::Pending);
        assert_eq!(outcome.report.outcomes.len(), 7);
    }

    #[tokio::test]
    async fn failing_run_flags_the_submission() {
        let mut submissions = MockSubmissionRepository::new();
        submissions
            .expect_find_by_id()
            .returning(|_| Ok(Some(stored(2, "Buy now! Click here! Free money!", SubmissionStatus::Pending))));
        submissions
            .expect_store_moderation_outcome()
            .withf(|_, _, _, status| *status == SubmissionStatus::Flagged)
            .returning(|_, _, _, _| Ok(()));

        let mut logs = MockModerationLogRepository::new();
        logs.expect_append().times(7).returning(|_, _| Ok(()));

        let outcome = engine(submissions, logs).run(2).await.unwrap();
        assert!(outcome.flagged());
        assert_eq!(outcome.status, SubmissionStatus::Flagged);
        assert!(
            outcome
                .report
                .outcomes
                .iter()
                .any(|o| o.verdict == Verdict::Fail)
        );
    }

    #[tokio::test]
    async fn duplicate_candidate_is_prefetched_for_hashed_images() {
        let mut submissions = MockSubmissionRepository::new();
        submissions.expect_find_by_id().returning(|_| {
            let mut s = stored(3, "an ordinary caption here", SubmissionStatus::Pending);
            s.image_hash = Some("abcd1234abcd1234".into());
            Ok(Some(s))
        });
        submissions
            .expect_find_live_duplicate()
            .with(eq("abcd1234abcd1234"), eq(3))
            .returning(|_, _| Ok(Some(9)));
        submissions
            .expect_store_moderation_outcome()
            .withf(|_, _, flags, status| {
                *status == SubmissionStatus::Flagged
                    && flags.iter().any(|o| o.detail.contains("#9"))
            })
            .returning(|_, _, _, _| Ok(()));

        let mut logs = MockModerationLogRepository::new();
        logs.expect_append().times(7).returning(|_, _| Ok(()));

        let outcome = engine(submissions, logs).run(3).await.unwrap();
        assert!(outcome.flagged());
    }

    #[tokio::test]
    async fn missing_submission_is_a_typed_error() {
        let mut submissions = MockSubmissionRepository::new();
        submissions.expect_find_by_id().returning(|_| Ok(None));
        let logs = MockModerationLogRepository::new();

        let err = engine(submissions, logs).run(404).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn aborted_run_leaves_a_system_audit_row() {
        let submissions = MockSubmissionRepository::new();
        let mut logs = MockModerationLogRepository::new();
        logs.expect_append()
            .withf(|id, outcome| {
                *id == 5
                    && outcome.check == CheckKind::System
                    && outcome.verdict == Verdict::Fail
                    && outcome.detail.contains("settings unavailable")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        engine(submissions, logs)
            .record_failure(5, "moderation run aborted: settings unavailable")
            .await;
    }

    #[test]
    fn run_guard_rejects_second_acquisition_and_releases_on_drop() {
        let in_flight = Mutex::new(HashSet::new());
        let guard = RunGuard::acquire(&in_flight, 7).unwrap();
        assert!(matches!(
            RunGuard::acquire(&in_flight, 7),
            Err(DomainError::ModerationInProgress(7))
        ));
        // A different id is unaffected
        let other = RunGuard::acquire(&in_flight, 8).unwrap();
        drop(other);
        drop(guard);
        assert!(RunGuard::acquire(&in_flight, 7).is_ok());
    }
}
