//! Pluggable profanity word list.
//!
//! The profanity check treats its lexicon as an optional collaborator: when
//! none is wired in, the check records a pass with an explanatory detail
//! instead of failing open or closed by accident.

use std::collections::HashSet;

/// Word-list capability consumed by the profanity check.
pub trait ProfanityLexicon: Send + Sync {
    fn contains_profanity(&self, text: &str) -> bool;

    /// Returns the text with profane tokens masked, for audit details.
    fn censor(&self, text: &str) -> String;
}

const BUILTIN_WORDS: &[&str] = &[
    "fuck", "fuk", "shit", "bitch", "asshole", "bastard", "dick", "cunt", "slut", "whore",
];

/// Token-matching lexicon over a lowercase word set.
pub struct WordListLexicon {
    words: HashSet<String>,
}

impl WordListLexicon {
    pub fn builtin() -> Self {
        Self::from_words(BUILTIN_WORDS.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn is_profane_token(&self, token: &str) -> bool {
        let normalized: String = token
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        !normalized.is_empty() && self.words.contains(&normalized)
    }
}

impl ProfanityLexicon for WordListLexicon {
    fn contains_profanity(&self, text: &str) -> bool {
        text.split_whitespace().any(|t| self.is_profane_token(t))
    }

    fn censor(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|t| {
                if self.is_profane_token(t) {
                    "*".repeat(t.chars().count())
                } else {
                    t.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
