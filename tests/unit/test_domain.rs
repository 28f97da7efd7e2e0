use soapbox::domain::moderation::blacklist::BlacklistEntry;
use soapbox::domain::moderation::checks::{CheckContext, run_registry};
use soapbox::domain::moderation::profanity::WordListLexicon;
use soapbox::domain::moderation::quick_check::quick_check;
use soapbox::domain::moderation::verdict::{CheckKind, ModerationReport, Verdict};
use soapbox::domain::settings::ModerationSettings;
use soapbox::domain::submission::entity::PostType;
use soapbox::domain::submission::lifecycle::{
    LifecycleEvent, SubmissionStatus, initial_status, transition,
};
use soapbox::domain::submission::value_objects::Caption;

#[test]
fn caption_intake_bounds() {
    assert!(Caption::new("a decent caption").is_ok());
    assert!(Caption::new("   ").is_err());
    assert!(Caption::new(&"x".repeat(5001)).is_err());
}

#[test]
fn free_submission_walks_pending_to_published() {
    let settings = ModerationSettings::default();
    let mut status = initial_status(PostType::Free, &settings);
    assert_eq!(status, SubmissionStatus::Pending);

    status = transition(status, LifecycleEvent::AdminApproved).unwrap();
    assert_eq!(status, SubmissionStatus::Approved);

    status = transition(status, LifecycleEvent::Published).unwrap();
    assert_eq!(status, SubmissionStatus::Published);
    assert!(status.is_terminal());
}

#[test]
fn promotional_submission_waits_for_payment_then_review() {
    let settings = ModerationSettings::default();
    let mut status = initial_status(PostType::Promotional, &settings);
    assert_eq!(status, SubmissionStatus::PaymentPending);

    status = transition(
        status,
        LifecycleEvent::PaymentCompleted {
            requires_review: settings.promo_requires_review,
        },
    )
    .unwrap();
    assert_eq!(status, SubmissionStatus::Pending);
}

#[test]
fn flagged_submission_needs_admin_override_before_publication() {
    let mut status = SubmissionStatus::Pending;
    status = transition(status, LifecycleEvent::ModerationFlagged).unwrap();
    assert_eq!(status, SubmissionStatus::Flagged);
    assert!(transition(status, LifecycleEvent::Published).is_err());

    status = transition(status, LifecycleEvent::AdminApproved).unwrap();
    status = transition(status, LifecycleEvent::Published).unwrap();
    assert_eq!(status, SubmissionStatus::Published);
}

#[test]
fn spammy_caption_fails_the_full_registry() {
    let ctx = CheckContext {
        caption: "Buy now! Click here! Free money!",
        ..Default::default()
    };
    let report = ModerationReport::new(run_registry(
        &ctx,
        &ModerationSettings::default(),
        &[],
        None,
    ));
    assert!(report.flagged());
    assert!(report.score() >= 1.0);
    let spam = report
        .outcomes
        .iter()
        .find(|o| o.check == CheckKind::Spam)
        .unwrap();
    assert_eq!(spam.verdict, Verdict::Fail);
}

#[test]
fn registry_never_short_circuits() {
    // Hate speech fails immediately, but every other check still reports.
    let ctx = CheckContext {
        caption: "death to all of it, also visit https://spam.example",
        ..Default::default()
    };
    let outcomes = run_registry(&ctx, &ModerationSettings::default(), &[], None);
    assert_eq!(outcomes.len(), 7);
    assert!(
        outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Fail)
            .count()
            >= 2
    );
}

#[test]
fn quick_check_and_registry_agree_on_blacklisted_content() {
    let entries = vec![BlacklistEntry::active(1, "cryptogiveaway")];
    let caption = "join my CRYPTOGIVEAWAY today";
    let lexicon = WordListLexicon::builtin();

    let quick = quick_check(caption, &entries, Some(&lexicon));
    assert!(quick.flagged);

    let ctx = CheckContext {
        caption,
        ..Default::default()
    };
    let report = ModerationReport::new(run_registry(
        &ctx,
        &ModerationSettings::default(),
        &entries,
        Some(&lexicon),
    ));
    assert!(report.flagged());
}

#[test]
fn settings_snapshot_drives_link_policy() {
    let caption = "check www.example.com for more";
    let blocking = ModerationSettings::default();
    let permissive = ModerationSettings {
        block_links: false,
        ..ModerationSettings::default()
    };

    let ctx = CheckContext {
        caption,
        ..Default::default()
    };
    let strict = ModerationReport::new(run_registry(&ctx, &blocking, &[], None));
    let lenient = ModerationReport::new(run_registry(&ctx, &permissive, &[], None));
    assert!(strict.flagged());
    assert!(!lenient.flagged());
}

#[test]
fn settings_rows_round_trip_into_snapshot() {
    let snapshot = ModerationSettings::from_pairs([
        ("auto_publish", "true"),
        ("promo_requires_review", "false"),
        ("promo_amount_cents", "500"),
    ]);
    assert!(snapshot.auto_publish);
    assert!(!snapshot.promo_requires_review);
    assert_eq!(snapshot.promo_amount_cents, 500);

    // Auto-publish policy now admits free posts directly
    assert_eq!(
        initial_status(PostType::Free, &snapshot),
        SubmissionStatus::Approved
    );
}
