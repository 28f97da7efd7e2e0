//! Check verdicts and run aggregation.
//!
//! Every check produces a [`CheckOutcome`]; a finished run is a
//! [`ModerationReport`]. Scoring is count-based: each fail contributes 1.0
//! and each warning 0.3, and a run flags the submission when it has at least
//! one fail or at least three warnings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The checks the registry runs, in their fixed execution order.
/// `System` marks pipeline-level failures: a run that aborted before it
/// could produce a report logs one `System` fail row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Profanity,
    HateSpeech,
    Spam,
    Blacklist,
    Link,
    Duplicate,
    CaptionLength,
    System,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profanity => "profanity",
            Self::HateSpeech => "hate_speech",
            Self::Spam => "spam",
            Self::Blacklist => "blacklist",
            Self::Link => "link",
            Self::Duplicate => "duplicate",
            Self::CaptionLength => "caption_length",
            Self::System => "system",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Warning,
    Fail,
}

/// Score contribution of one fail verdict.
pub const FAIL_WEIGHT: f64 = 1.0;
/// Score contribution of one warning verdict.
pub const WARNING_WEIGHT: f64 = 0.3;
/// Number of warnings that flags a run on its own.
pub const WARNING_FLAG_THRESHOLD: usize = 3;

/// Result of one check execution. Serialized as-is into the submission's
/// `moderation_flags` column, so it must stay re-parseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check: CheckKind,
    pub verdict: Verdict,
    /// Score contribution: 1.0 for fail, 0.3 for warning, 0.0 for pass
    pub score: f64,
    pub detail: String,
}

impl CheckOutcome {
    pub fn pass(check: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            check,
            verdict: Verdict::Pass,
            score: 0.0,
            detail: detail.into(),
        }
    }

    pub fn warning(check: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            check,
            verdict: Verdict::Warning,
            score: WARNING_WEIGHT,
            detail: detail.into(),
        }
    }

    pub fn fail(check: CheckKind, detail: impl Into<String>) -> Self {
        Self {
            check,
            verdict: Verdict::Fail,
            score: FAIL_WEIGHT,
            detail: detail.into(),
        }
    }
}

/// Aggregated outcome of one full moderation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl ModerationReport {
    pub fn new(outcomes: Vec<CheckOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn fails(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Fail)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Warning)
            .count()
    }

    /// `fails * 1.0 + warnings * 0.3`, summed, never averaged.
    pub fn score(&self) -> f64 {
        self.fails() as f64 * FAIL_WEIGHT + self.warnings() as f64 * WARNING_WEIGHT
    }

    /// A run flags the submission on any fail, or on three or more warnings.
    pub fn flagged(&self) -> bool {
        self.fails() > 0 || self.warnings() >= WARNING_FLAG_THRESHOLD
    }
}

/// Append-only audit row: one per check execution per submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    pub id: i64,
    pub submission_id: i64,
    pub check: CheckKind,
    pub verdict: Verdict,
    pub score: f64,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}
