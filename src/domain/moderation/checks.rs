//! The check registry: a fixed, ordered set of pure content checks.
//!
//! Each check maps (caption, context, settings snapshot, comparison data) to
//! one [`CheckOutcome`]. The registry always runs every check; there is no
//! short-circuit, so a complete audit trail exists even when an early check
//! already failed. All I/O (settings, blacklist, duplicate candidate) happens
//! before the registry runs; the checks themselves touch nothing but their
//! arguments.

use lazy_static::lazy_static;
use regex::Regex;

use crate::domain::settings::ModerationSettings;
use super::blacklist::BlacklistEntry;
use super::profanity::ProfanityLexicon;
use super::verdict::{CheckKind, CheckOutcome};

lazy_static! {
    /// High-severity hate indicators. Deliberately small; administrators
    /// extend coverage through the blacklist.
    static ref HATE_PATTERNS: Vec<Regex> = [
        r"(?i)kill\s+all",
        r"(?i)death\s+to",
        r"(?i)go\s+back\s+to\s+your\s+country",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("hate pattern must compile"))
    .collect();

    static ref SPAM_PATTERNS: Vec<Regex> = [
        r"(?i)buy\s+now",
        r"(?i)click\s+here",
        r"(?i)free\s+money",
        r"(?i)make\s+\$?\d+",
        r"(?i)earn\s+\$?\d+",
        r"(?i)(viagra|cialis)",
        r"(?i)limited\s+time\s+offer",
        r"(?i)act\s+now",
        r"(?i)winner",
        r"(?i)congratulations.*won",
        r"(?i)100%\s+free",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("spam pattern must compile"))
    .collect();

    /// Permissive URL matcher: http(s) links and bare www. domains.
    static ref URL_PATTERN: Regex =
        Regex::new(r"(?i)https?://[^\s]+|www\.[\w\-]+\.[\w\-]+").expect("url pattern must compile");
}

/// Per-submission inputs to the registry, read as of the start of the run.
#[derive(Debug, Clone, Default)]
pub struct CheckContext<'a> {
    pub caption: &'a str,
    /// Perceptual fingerprint of the cover image, when one exists
    pub image_hash: Option<&'a str>,
    /// Id of another live submission sharing the same fingerprint,
    /// pre-fetched by the engine before the run starts
    pub duplicate_of: Option<i64>,
}

/// Runs every check in registry order and returns their outcomes.
pub fn run_registry(
    ctx: &CheckContext<'_>,
    settings: &ModerationSettings,
    blacklist: &[BlacklistEntry],
    lexicon: Option<&dyn ProfanityLexicon>,
) -> Vec<CheckOutcome> {
    vec![
        check_profanity(ctx.caption, lexicon),
        check_hate_speech(ctx.caption),
        check_spam(ctx.caption),
        check_blacklist(ctx.caption, blacklist),
        check_links(ctx.caption, settings),
        check_duplicate(ctx),
        check_caption_length(ctx.caption, settings),
    ]
}

/// Fails on any profane term. Without a lexicon the check degrades to a pass
/// with an explanatory detail, never an accidental fail in either direction.
pub fn check_profanity(caption: &str, lexicon: Option<&dyn ProfanityLexicon>) -> CheckOutcome {
    let Some(lexicon) = lexicon else {
        return CheckOutcome::pass(
            CheckKind::Profanity,
            "Profanity check skipped (word list unavailable)",
        );
    };
    if lexicon.contains_profanity(caption) {
        let censored: String = lexicon.censor(caption).chars().take(200).collect();
        CheckOutcome::fail(
            CheckKind::Profanity,
            format!("Profanity detected. Censored: {censored}"),
        )
    } else {
        CheckOutcome::pass(CheckKind::Profanity, "No profanity detected")
    }
}

/// Fails on any match against the built-in high-severity indicator set.
pub fn check_hate_speech(caption: &str) -> CheckOutcome {
    for pattern in HATE_PATTERNS.iter() {
        if pattern.is_match(caption) {
            return CheckOutcome::fail(
                CheckKind::HateSpeech,
                format!("Hate speech pattern detected: {}", pattern.as_str()),
            );
        }
    }
    CheckOutcome::pass(CheckKind::HateSpeech, "No hate speech detected")
}

/// Counts distinct spam-indicator matches: 0 passes, 1 warns, 2+ fail.
pub fn check_spam(caption: &str) -> CheckOutcome {
    let matches = SPAM_PATTERNS
        .iter()
        .filter(|p| p.is_match(caption))
        .count();
    match matches {
        0 => CheckOutcome::pass(CheckKind::Spam, "No spam detected"),
        1 => CheckOutcome::warning(CheckKind::Spam, "Possible spam pattern detected"),
        n => CheckOutcome::fail(
            CheckKind::Spam,
            format!("Multiple spam patterns detected: {n}"),
        ),
    }
}

/// Case-insensitive substring match against active admin keywords.
pub fn check_blacklist(caption: &str, blacklist: &[BlacklistEntry]) -> CheckOutcome {
    let caption_lower = caption.to_lowercase();
    let found: Vec<&str> = blacklist
        .iter()
        .filter(|e| e.is_active && caption_lower.contains(&e.keyword.to_lowercase()))
        .map(|e| e.keyword.as_str())
        .collect();

    if found.is_empty() {
        CheckOutcome::pass(CheckKind::Blacklist, "No blacklisted keywords")
    } else {
        CheckOutcome::fail(
            CheckKind::Blacklist,
            format!("Blacklisted keywords found: {}", found.join(", ")),
        )
    }
}

/// URLs fail when `block_links` is set, otherwise warn.
pub fn check_links(caption: &str, settings: &ModerationSettings) -> CheckOutcome {
    let urls = URL_PATTERN.find_iter(caption).count();
    if urls == 0 {
        CheckOutcome::pass(CheckKind::Link, "No links detected")
    } else if settings.block_links {
        CheckOutcome::fail(
            CheckKind::Link,
            format!("Links found and blocked: {urls} URL(s)"),
        )
    } else {
        CheckOutcome::warning(CheckKind::Link, format!("Links found: {urls} URL(s)"))
    }
}

/// Fails when another live submission shares this image fingerprint.
/// Submissions without a fingerprint pass trivially.
pub fn check_duplicate(ctx: &CheckContext<'_>) -> CheckOutcome {
    if ctx.image_hash.is_none() {
        return CheckOutcome::pass(CheckKind::Duplicate, "No image hash to compare");
    }
    match ctx.duplicate_of {
        Some(other) => CheckOutcome::fail(
            CheckKind::Duplicate,
            format!("Duplicate image detected (matches submission #{other})"),
        ),
        None => CheckOutcome::pass(CheckKind::Duplicate, "No duplicate content"),
    }
}

/// Over the configured maximum fails; under the minimum warns (near-empty
/// captions are suspicious); otherwise passes.
pub fn check_caption_length(caption: &str, settings: &ModerationSettings) -> CheckOutcome {
    let len = caption.chars().count();
    if len > settings.max_caption_length {
        CheckOutcome::fail(
            CheckKind::CaptionLength,
            format!(
                "Caption too long: {len}/{} chars",
                settings.max_caption_length
            ),
        )
    } else if len < settings.min_caption_length {
        CheckOutcome::warning(
            CheckKind::CaptionLength,
            format!(
                "Caption too short (less than {} chars)",
                settings.min_caption_length
            ),
        )
    } else {
        CheckOutcome::pass(
            CheckKind::CaptionLength,
            format!("Caption length OK: {len} chars"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moderation::profanity::WordListLexicon;
    use crate::domain::moderation::verdict::{ModerationReport, Verdict};

    fn defaults() -> ModerationSettings {
        ModerationSettings::default()
    }

    #[test]
    fn registry_runs_every_check_in_order() {
        let ctx = CheckContext {
            caption: "a perfectly normal caption about the weather",
            ..Default::default()
        };
        let outcomes = run_registry(&ctx, &defaults(), &[], None);
        let kinds: Vec<CheckKind> = outcomes.iter().map(|o| o.check).collect();
        assert_eq!(
            kinds,
            vec![
                CheckKind::Profanity,
                CheckKind::HateSpeech,
                CheckKind::Spam,
                CheckKind::Blacklist,
                CheckKind::Link,
                CheckKind::Duplicate,
                CheckKind::CaptionLength,
            ]
        );
    }

    #[test]
    fn clean_caption_passes_everything() {
        let ctx = CheckContext {
            caption: "Sunset over the river tonight, what a view from the bridge",
            ..Default::default()
        };
        let lexicon = WordListLexicon::builtin();
        let outcomes = run_registry(&ctx, &defaults(), &[], Some(&lexicon));
        let report = ModerationReport::new(outcomes);
        assert_eq!(report.fails(), 0);
        assert_eq!(report.warnings(), 0);
        assert_eq!(report.score(), 0.0);
        assert!(!report.flagged());
    }

    #[test]
    fn missing_lexicon_degrades_to_explained_pass() {
        let outcome = check_profanity("whatever text", None);
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.detail.contains("skipped"));
    }

    #[test]
    fn hate_patterns_match_case_insensitively() {
        assert_eq!(check_hate_speech("DEATH TO everyone").verdict, Verdict::Fail);
        assert_eq!(check_hate_speech("a caption about death metal").verdict, Verdict::Pass);
    }

    #[test]
    fn spam_tiering_counts_distinct_patterns() {
        assert_eq!(check_spam("just a photo").verdict, Verdict::Pass);
        assert_eq!(check_spam("act now while it lasts").verdict, Verdict::Warning);
        // Three distinct spam patterns
        let outcome = check_spam("Buy now! Click here! Free money!");
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains('3'));
    }

    #[test]
    fn blacklist_is_case_insensitive_and_substring_based() {
        let entries = vec![BlacklistEntry::active(1, "spam")];
        assert_eq!(
            check_blacklist("this is SPAMtastic", &entries).verdict,
            Verdict::Fail
        );
        assert_eq!(
            check_blacklist("totally fine caption", &entries).verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn inactive_blacklist_entries_are_ignored() {
        let mut entry = BlacklistEntry::active(1, "crypto");
        entry.is_active = false;
        assert_eq!(
            check_blacklist("crypto content here", &[entry]).verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn links_fail_when_blocked_warn_otherwise() {
        let mut settings = defaults();
        assert_eq!(
            check_links("see https://example.com/post", &settings).verdict,
            Verdict::Fail
        );
        settings.block_links = false;
        assert_eq!(
            check_links("see https://example.com/post", &settings).verdict,
            Verdict::Warning
        );
        assert_eq!(
            check_links("visit www.example.com sometime", &settings).verdict,
            Verdict::Warning
        );
        assert_eq!(check_links("no links here", &settings).verdict, Verdict::Pass);
    }

    #[test]
    fn duplicate_requires_hash_and_live_match() {
        let no_hash = CheckContext {
            caption: "x",
            ..Default::default()
        };
        assert_eq!(check_duplicate(&no_hash).verdict, Verdict::Pass);

        let with_match = CheckContext {
            caption: "x",
            image_hash: Some("abcd1234abcd1234"),
            duplicate_of: Some(42),
        };
        let outcome = check_duplicate(&with_match);
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("#42"));

        let no_match = CheckContext {
            caption: "x",
            image_hash: Some("abcd1234abcd1234"),
            duplicate_of: None,
        };
        assert_eq!(check_duplicate(&no_match).verdict, Verdict::Pass);
    }

    #[test]
    fn caption_length_boundaries() {
        let settings = defaults();
        assert_eq!(check_caption_length("x", &settings).verdict, Verdict::Warning);
        assert_eq!(
            check_caption_length("long enough caption", &settings).verdict,
            Verdict::Pass
        );
        let long = "y".repeat(settings.max_caption_length + 1);
        assert_eq!(check_caption_length(&long, &settings).verdict, Verdict::Fail);
        let exactly_max = "y".repeat(settings.max_caption_length);
        assert_eq!(
            check_caption_length(&exactly_max, &settings).verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn spam_scenario_flags_overall_run() {
        let ctx = CheckContext {
            caption: "Buy now! Click here! Free money!",
            ..Default::default()
        };
        let report = ModerationReport::new(run_registry(&ctx, &defaults(), &[], None));
        assert!(report.flagged());
        assert!(report.fails() >= 1);
    }

    #[test]
    fn three_warning_scenario_scores_point_nine() {
        // 1-char caption (warning) + one spam pattern (warning) + link with
        // blocking off (warning) = 3 warnings, 0 fails, score 0.9, flagged.
        let settings = ModerationSettings {
            block_links: false,
            ..ModerationSettings::default()
        };
        let ctx = CheckContext {
            caption: "w",
            ..Default::default()
        };
        let mut outcomes = run_registry(&ctx, &settings, &[], None);
        // Swap in the two extra warnings the scenario describes
        outcomes.retain(|o| o.check != CheckKind::Spam && o.check != CheckKind::Link);
        outcomes.push(check_spam("act now"));
        outcomes.push(check_links("www.example.com", &settings));
        let report = ModerationReport::new(outcomes);
        assert_eq!(report.fails(), 0);
        assert_eq!(report.warnings(), 3);
        assert!((report.score() - 0.9).abs() < 1e-9);
        assert!(report.flagged());
    }
}
