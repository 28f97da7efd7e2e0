use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tracing::{debug, error};

use super::{CaptionError, CaptionGenerator, CaptionStyle};
use async_trait::async_trait;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.0-flash";

pub struct GeminiCaptionGenerator {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
}

impl GeminiCaptionGenerator {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key,
        }
    }

    #[cfg(test)]
    fn with_api_base(mut self, base: String) -> Self {
        self.api_base = base;
        self
    }

    fn key(&self) -> Result<&str, CaptionError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CaptionError::NotConfigured)
    }

    fn build_prompt(original_caption: Option<&str>, style: CaptionStyle) -> String {
        let mut prompt = format!(
            "You are writing a social media caption for the attached image. {}",
            style.instruction()
        );
        if let Some(original) = original_caption.filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!(
                " The submitter provided this caption, keep its intent and any \
                 names or facts it mentions: \"{original}\""
            ));
        }
        prompt.push_str(" Reply with the caption text only, no preamble or quotes.");
        prompt
    }

    fn sniff_mime(image: &[u8]) -> &'static str {
        match image {
            [0x89, b'P', b'N', b'G', ..] => "image/png",
            [0xFF, 0xD8, ..] => "image/jpeg",
            [b'G', b'I', b'F', ..] => "image/gif",
            [b'R', b'I', b'F', b'F', ..] => "image/webp",
            _ => "image/jpeg",
        }
    }
}

#[async_trait]
impl CaptionGenerator for GeminiCaptionGenerator {
    fn is_configured(&self) -> bool {
        self.key().is_ok()
    }

    async fn generate<'a>(
        &self,
        image: &[u8],
        original_caption: Option<&'a str>,
        style: CaptionStyle,
    ) -> Result<String, CaptionError> {
        let key = self.key()?;
        let payload = json!({
            "contents": [{
                "parts": [
                    { "text": Self::build_prompt(original_caption, style) },
                    { "inline_data": {
                        "mime_type": Self::sniff_mime(image),
                        "data": BASE64.encode(image),
                    }},
                ],
            }],
        });

        let body: Value = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.api_base, MODEL
            ))
            .query(&[("key", key)])
            .json(&payload)
            .send()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| CaptionError::Transport(e.to_string()))?;

        if let Some(message) = body["error"]["message"].as_str() {
            error!("caption API error: {message}");
            return Err(CaptionError::Api(message.to_string()));
        }

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|t| t.trim().trim_matches('"').to_string())
            .filter(|t| !t.is_empty())
            .ok_or(CaptionError::EmptyResponse)?;
        debug!("generated {} caption ({} chars)", style, text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_configured() {
        assert!(!GeminiCaptionGenerator::new(None).is_configured());
        assert!(!GeminiCaptionGenerator::new(Some(String::new())).is_configured());
        assert!(GeminiCaptionGenerator::new(Some("k".into())).is_configured());
    }

    #[test]
    fn prompt_carries_original_caption() {
        let prompt =
            GeminiCaptionGenerator::build_prompt(Some("sunset at the pier"), CaptionStyle::Minimal);
        assert!(prompt.contains("sunset at the pier"));
        assert!(prompt.contains("understated"));

        let bare = GeminiCaptionGenerator::build_prompt(Some("   "), CaptionStyle::Minimal);
        assert!(!bare.contains("submitter provided"));
    }

    #[test]
    fn mime_sniffing_recognizes_common_formats() {
        assert_eq!(GeminiCaptionGenerator::sniff_mime(&[0x89, b'P', b'N', b'G', 0]), "image/png");
        assert_eq!(GeminiCaptionGenerator::sniff_mime(&[0xFF, 0xD8, 0xFF]), "image/jpeg");
        assert_eq!(GeminiCaptionGenerator::sniff_mime(b"garbage"), "image/jpeg");
    }

    #[tokio::test]
    async fn unconfigured_generator_fails_fast() {
        let generator =
            GeminiCaptionGenerator::new(None).with_api_base("http://127.0.0.1:1".into());
        let err = generator
            .generate(b"img", None, CaptionStyle::Engaging)
            .await
            .unwrap_err();
        assert!(matches!(err, CaptionError::NotConfigured));
    }
}
