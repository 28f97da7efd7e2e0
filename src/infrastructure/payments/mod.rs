//! Checkout provider boundary and webhook plumbing.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// A hosted checkout session the submitter is redirected to.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout provider not configured")]
    NotConfigured,
    #[error("checkout API error: {0}")]
    Api(String),
    #[error("checkout transport error: {0}")]
    Transport(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Creates a checkout session for a promotional submission. The
    /// submission id travels in the session metadata and comes back on the
    /// webhook.
    async fn create_session<'a>(
        &self,
        submission_id: i64,
        amount_cents: i64,
        payer_email: Option<&'a str>,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, CheckoutError>;
}
