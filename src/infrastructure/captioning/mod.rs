//! AI caption generation.
//!
//! Captioning is a best-effort enhancement: callers treat every error here
//! as non-fatal and keep the submitter's own caption.

pub mod gemini;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tone presets for generated captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionStyle {
    #[default]
    Engaging,
    Minimal,
    Storytelling,
    Funny,
    Professional,
}

impl CaptionStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engaging => "engaging",
            Self::Minimal => "minimal",
            Self::Storytelling => "storytelling",
            Self::Funny => "funny",
            Self::Professional => "professional",
        }
    }

    /// Style-specific instruction appended to the base prompt.
    fn instruction(&self) -> &'static str {
        match self {
            Self::Engaging => {
                "Write an engaging, upbeat caption that invites comments. \
                 Include 3-5 relevant hashtags."
            }
            Self::Minimal => "Write a short, understated caption of at most one sentence. No hashtags.",
            Self::Storytelling => {
                "Write a short narrative caption that tells the story behind the image. \
                 Two or three sentences, then 2-3 hashtags."
            }
            Self::Funny => "Write a witty, lighthearted caption. One or two sentences, 2-3 hashtags.",
            Self::Professional => {
                "Write a polished, professional caption suitable for a brand account. \
                 No slang, 3-4 hashtags."
            }
        }
    }
}

impl fmt::Display for CaptionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptionStyle {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "engaging" | "" => Ok(Self::Engaging),
            "minimal" => Ok(Self::Minimal),
            "storytelling" | "story" => Ok(Self::Storytelling),
            "funny" | "humorous" => Ok(Self::Funny),
            "professional" => Ok(Self::Professional),
            other => Err(CaptionError::UnknownStyle(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption generator not configured")]
    NotConfigured,
    #[error("unknown caption style: {0}")]
    UnknownStyle(String),
    #[error("caption API error: {0}")]
    Api(String),
    #[error("caption transport error: {0}")]
    Transport(String),
    #[error("caption response was empty")]
    EmptyResponse,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Produces a caption for the image, guided by the submitter's original
    /// caption when one exists.
    async fn generate<'a>(
        &self,
        image: &[u8],
        original_caption: Option<&'a str>,
        style: CaptionStyle,
    ) -> Result<String, CaptionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_parses_leniently() {
        assert_eq!("Storytelling".parse::<CaptionStyle>().unwrap(), CaptionStyle::Storytelling);
        assert_eq!("  FUNNY ".parse::<CaptionStyle>().unwrap(), CaptionStyle::Funny);
        assert_eq!("".parse::<CaptionStyle>().unwrap(), CaptionStyle::Engaging);
        assert!(matches!(
            "dramatic".parse::<CaptionStyle>(),
            Err(CaptionError::UnknownStyle(s)) if s == "dramatic"
        ));
    }

    #[test]
    fn every_style_has_an_instruction() {
        for style in [
            CaptionStyle::Engaging,
            CaptionStyle::Minimal,
            CaptionStyle::Storytelling,
            CaptionStyle::Funny,
            CaptionStyle::Professional,
        ] {
            assert!(!style.instruction().is_empty());
        }
    }
}
