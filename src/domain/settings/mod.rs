//! Administratively editable system settings.
//!
//! Settings are stored as key/value rows and read into an immutable
//! [`ModerationSettings`] snapshot at the start of each moderation run or
//! submission intake. Checks never read settings on demand, so a run always
//! observes one consistent configuration even if an administrator edits a
//! value mid-run.

use serde::{Deserialize, Serialize};

/// Well-known setting keys. The admin surface accepts arbitrary keys, but
/// only these influence core behavior.
pub mod keys {
    pub const BLOCK_LINKS: &str = "block_links";
    pub const MAX_CAPTION_LENGTH: &str = "max_caption_length";
    pub const MIN_CAPTION_LENGTH: &str = "min_caption_length";
    pub const AUTO_PUBLISH: &str = "auto_publish";
    pub const REQUIRE_APPROVAL: &str = "require_approval";
    pub const PROMO_REQUIRES_REVIEW: &str = "promo_requires_review";
    pub const PROMO_AMOUNT_CENTS: &str = "promo_amount_cents";
}

/// Immutable configuration snapshot passed into every check invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationSettings {
    /// When true, any URL in a caption fails the link check instead of warning.
    pub block_links: bool,

    /// Captions longer than this (in characters) fail the length check.
    pub max_caption_length: usize,

    /// Captions shorter than this (in characters) get a length warning.
    pub min_caption_length: usize,

    /// Attempt automated publication of free posts that pass moderation.
    pub auto_publish: bool,

    /// Force human review even when auto-publish is enabled.
    pub require_approval: bool,

    /// Whether a promotional post returns to human review after payment,
    /// or goes straight to approved.
    pub promo_requires_review: bool,

    /// Fixed price of a promotional post, in cents.
    pub promo_amount_cents: i64,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            block_links: true,
            max_caption_length: 2200,
            min_caption_length: 3,
            auto_publish: false,
            require_approval: false,
            promo_requires_review: true,
            promo_amount_cents: 200,
        }
    }
}

impl ModerationSettings {
    /// Builds a snapshot from persisted key/value pairs.
    ///
    /// Unknown keys are ignored; unparseable values fall back to the default
    /// for that key so one corrupt row cannot take moderation down.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                keys::BLOCK_LINKS => settings.block_links = parse_bool(value, settings.block_links),
                keys::MAX_CAPTION_LENGTH => {
                    settings.max_caption_length =
                        value.parse().unwrap_or(settings.max_caption_length);
                }
                keys::MIN_CAPTION_LENGTH => {
                    settings.min_caption_length =
                        value.parse().unwrap_or(settings.min_caption_length);
                }
                keys::AUTO_PUBLISH => settings.auto_publish = parse_bool(value, settings.auto_publish),
                keys::REQUIRE_APPROVAL => {
                    settings.require_approval = parse_bool(value, settings.require_approval);
                }
                keys::PROMO_REQUIRES_REVIEW => {
                    settings.promo_requires_review =
                        parse_bool(value, settings.promo_requires_review);
                }
                keys::PROMO_AMOUNT_CENTS => {
                    settings.promo_amount_cents =
                        value.parse().unwrap_or(settings.promo_amount_cents);
                }
                _ => {}
            }
        }
        settings
    }
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let s = ModerationSettings::default();
        assert!(s.block_links);
        assert_eq!(s.max_caption_length, 2200);
        assert_eq!(s.min_caption_length, 3);
        assert!(!s.auto_publish);
        assert!(s.promo_requires_review);
    }

    #[test]
    fn pairs_override_defaults() {
        let s = ModerationSettings::from_pairs([
            ("block_links", "false"),
            ("max_caption_length", "500"),
            ("auto_publish", "true"),
        ]);
        assert!(!s.block_links);
        assert_eq!(s.max_caption_length, 500);
        assert!(s.auto_publish);
        assert_eq!(s.min_caption_length, 3);
    }

    #[test]
    fn junk_values_fall_back_to_defaults() {
        let s = ModerationSettings::from_pairs([
            ("max_caption_length", "a lot"),
            ("block_links", "maybe"),
            ("totally_unknown", "42"),
        ]);
        assert_eq!(s, ModerationSettings::default());
    }
}
