use serde_json::Value;
use tracing::{debug, error};

use super::{CheckoutError, CheckoutProvider, CheckoutSession};
use async_trait::async_trait;

const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeCheckout {
    http: reqwest::Client,
    api_base: String,
    secret_key: Option<String>,
}

impl StripeCheckout {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            secret_key,
        }
    }

    fn secret(&self) -> Result<&str, CheckoutError> {
        self.secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CheckoutError::NotConfigured)
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    fn is_configured(&self) -> bool {
        self.secret().is_ok()
    }

    async fn create_session<'a>(
        &self,
        submission_id: i64,
        amount_cents: i64,
        payer_email: Option<&'a str>,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, CheckoutError> {
        let secret = self.secret()?;
        let submission_id = submission_id.to_string();
        let amount = amount_cents.to_string();

        // The checkout API takes flat form-encoded keys with bracket paths.
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                "Promoted community post",
            ),
            ("line_items[0][quantity]", "1"),
            ("metadata[submission_id]", &submission_id),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ];
        if let Some(email) = payer_email.filter(|e| !e.is_empty()) {
            form.push(("customer_email", email));
        }

        let body: Value = self
            .http
            .post(format!("{}/checkout/sessions", self.api_base))
            .basic_auth(secret, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| CheckoutError::Transport(e.to_string()))?;

        if let Some(message) = body["error"]["message"].as_str() {
            error!("checkout session creation failed: {message}");
            return Err(CheckoutError::Api(message.to_string()));
        }
        let session_id = body["id"]
            .as_str()
            .ok_or_else(|| CheckoutError::Api("session response missing id".into()))?
            .to_string();
        let checkout_url = body["url"]
            .as_str()
            .ok_or_else(|| CheckoutError::Api("session response missing url".into()))?
            .to_string();
        debug!("created checkout session {session_id}");
        Ok(CheckoutSession {
            session_id,
            checkout_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_requires_nonempty_secret() {
        assert!(!StripeCheckout::new(None).is_configured());
        assert!(!StripeCheckout::new(Some(String::new())).is_configured());
        assert!(StripeCheckout::new(Some("sk_test_x".into())).is_configured());
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_fast() {
        let provider = StripeCheckout::new(None);
        let err = provider
            .create_session(1, 200, None, "https://x/ok", "https://x/no")
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::NotConfigured));
    }
}
