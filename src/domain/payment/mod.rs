//! Payment domain types.
//!
//! The core does not talk to the payment provider; it only consumes terminal
//! payment outcomes delivered by the webhook and reads payment state for the
//! publishable predicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// One checkout attempt for a promotional submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub submission_id: i64,
    /// Opaque checkout session identifier from the provider
    pub session_id: Option<String>,
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new payment record.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub submission_id: i64,
    pub session_id: String,
    pub amount_cents: i64,
    pub currency: String,
}

/// Terminal payment outcomes delivered by the provider webhook, keyed by the
/// opaque identifiers the provider uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted {
        session_id: String,
        payment_intent_id: Option<String>,
        payer_email: Option<String>,
        /// Submission id carried in checkout metadata, used to backfill a
        /// payment record if the webhook arrives before ours was stored.
        submission_id: Option<i64>,
        amount_cents: Option<i64>,
    },
    CheckoutExpired {
        session_id: String,
    },
    ChargeRefunded {
        /// Payment intent id when the payload carries one, otherwise the
        /// charge id. Completed checkouts store the payment intent, so the
        /// intent is the key that actually finds the record.
        payment_ref: String,
    },
}
