//! Pre-save content check.
//!
//! Used by the submit handler before anything is persisted, and suitable for
//! real-time UI feedback. It reuses the exact same profanity, hate-speech and
//! blacklist checks as the persisted pipeline, so the two can never drift:
//! anything blocked here would also fail a full run.

use super::blacklist::BlacklistEntry;
use super::checks::{check_blacklist, check_hate_speech, check_profanity};
use super::profanity::ProfanityLexicon;
use super::verdict::Verdict;

/// Flagged/not-flagged verdict with a submitter-safe reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickCheckVerdict {
    pub flagged: bool,
    pub reason: Option<String>,
}

impl QuickCheckVerdict {
    fn clean() -> Self {
        Self {
            flagged: false,
            reason: None,
        }
    }

    fn blocked(reason: &str) -> Self {
        Self {
            flagged: true,
            reason: Some(reason.to_string()),
        }
    }
}

/// Runs the hard-block subset of the registry against a caption.
///
/// Reasons are generic by design: submitters never see internal detail
/// strings, only which broad category blocked them.
pub fn quick_check(
    caption: &str,
    blacklist: &[BlacklistEntry],
    lexicon: Option<&dyn ProfanityLexicon>,
) -> QuickCheckVerdict {
    if check_profanity(caption, lexicon).verdict == Verdict::Fail {
        return QuickCheckVerdict::blocked(
            "Your content contains inappropriate language and cannot be submitted.",
        );
    }
    if check_hate_speech(caption).verdict == Verdict::Fail {
        return QuickCheckVerdict::blocked(
            "Your content contains prohibited material and cannot be submitted.",
        );
    }
    if check_blacklist(caption, blacklist).verdict == Verdict::Fail {
        return QuickCheckVerdict::blocked(
            "Your content contains a restricted word and cannot be submitted.",
        );
    }
    QuickCheckVerdict::clean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moderation::profanity::WordListLexicon;

    #[test]
    fn clean_caption_is_not_flagged() {
        let lexicon = WordListLexicon::builtin();
        let verdict = quick_check("lovely evening at the lake", &[], Some(&lexicon));
        assert!(!verdict.flagged);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn profanity_blocks_with_generic_reason() {
        let lexicon = WordListLexicon::builtin();
        let verdict = quick_check("what the fuck", &[], Some(&lexicon));
        assert!(verdict.flagged);
        assert!(verdict.reason.unwrap().contains("inappropriate language"));
    }

    #[test]
    fn hate_pattern_blocks_without_lexicon() {
        let verdict = quick_check("death to them all", &[], None);
        assert!(verdict.flagged);
    }

    #[test]
    fn blacklist_blocks_case_insensitively() {
        let entries = vec![BlacklistEntry::active(1, "forbidden")];
        let verdict = quick_check("this is FORBIDDEN content", &entries, None);
        assert!(verdict.flagged);
        assert!(verdict.reason.unwrap().contains("restricted word"));
    }

    #[test]
    fn agrees_with_full_pipeline_on_blocked_content() {
        use crate::domain::moderation::checks::{CheckContext, run_registry};
        use crate::domain::moderation::verdict::ModerationReport;
        use crate::domain::settings::ModerationSettings;

        let entries = vec![BlacklistEntry::active(1, "banned")];
        let caption = "completely banned material";
        let quick = quick_check(caption, &entries, None);
        let ctx = CheckContext {
            caption,
            ..Default::default()
        };
        let report = ModerationReport::new(run_registry(
            &ctx,
            &ModerationSettings::default(),
            &entries,
            None,
        ));
        assert!(quick.flagged);
        assert!(report.flagged());
    }
}
