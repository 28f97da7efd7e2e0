use serde::{Deserialize, Serialize};
use validator::Validate;

/// Caption as accepted at intake.
///
/// Only structural bounds live here: non-empty after trimming, and a hard
/// ceiling well above any sane configuration. The administratively
/// configurable maximum is enforced by the caption-length moderation check,
/// not at intake, so an over-long caption is flagged rather than lost.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Caption {
    #[validate(length(min = 1, max = 5000))]
    pub value: String,
}

impl Caption {
    pub fn new(value: &str) -> Result<Self, validator::ValidationErrors> {
        let caption = Self {
            value: value.trim().to_string(),
        };
        caption.validate()?;
        Ok(caption)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_rejects_empty_and_whitespace() {
        assert!(Caption::new("").is_err());
        assert!(Caption::new("   ").is_err());
    }

    #[test]
    fn caption_trims_and_accepts_normal_text() {
        let c = Caption::new("  sunset over the bridge  ").unwrap();
        assert_eq!(c.value, "sunset over the bridge");
    }

    #[test]
    fn caption_enforces_hard_ceiling() {
        assert!(Caption::new(&"x".repeat(5001)).is_err());
        assert!(Caption::new(&"x".repeat(5000)).is_ok());
    }
}
