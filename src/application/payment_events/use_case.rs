//! Applies terminal payment outcomes delivered by the provider webhook.
//!
//! Events are idempotent: a completed event for an already completed payment
//! changes nothing, and events for unknown sessions are logged and dropped
//! rather than erroring the webhook (the provider retries on non-2xx).

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::payment::{NewPayment, PaymentEvent, PaymentRecord, PaymentStatus};
use crate::domain::settings::ModerationSettings;
use crate::domain::submission::errors::DomainError;
use crate::domain::submission::lifecycle::{LifecycleEvent, SubmissionStatus, transition};
use crate::domain::submission::repository::{
    PaymentRepository, SettingsRepository, SubmissionRepository,
};

pub struct PaymentEventsUseCase {
    submissions: Arc<dyn SubmissionRepository>,
    payments: Arc<dyn PaymentRepository>,
    settings: Arc<dyn SettingsRepository>,
}

impl PaymentEventsUseCase {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        payments: Arc<dyn PaymentRepository>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            submissions,
            payments,
            settings,
        }
    }

    #[instrument(skip(self, event))]
    pub async fn apply(&self, event: PaymentEvent) -> Result<(), DomainError> {
        match event {
            PaymentEvent::CheckoutCompleted {
                session_id,
                payment_intent_id,
                payer_email,
                submission_id,
                amount_cents,
            } => {
                self.complete(
                    &session_id,
                    payment_intent_id.as_deref(),
                    payer_email.as_deref(),
                    submission_id,
                    amount_cents,
                )
                .await
            }
            PaymentEvent::CheckoutExpired { session_id } => self.expire(&session_id).await,
            PaymentEvent::ChargeRefunded { payment_ref } => self.refund(&payment_ref).await,
        }
    }

    async fn complete(
        &self,
        session_id: &str,
        payment_intent_id: Option<&str>,
        payer_email: Option<&str>,
        submission_id: Option<i64>,
        amount_cents: Option<i64>,
    ) -> Result<(), DomainError> {
        let payment = match self.payments.find_by_session(session_id).await? {
            Some(payment) => payment,
            // The webhook can arrive before our own session bookkeeping was
            // stored; the metadata submission id lets us recover the link.
            None => match submission_id {
                Some(submission_id) => {
                    warn!("backfilling payment record for session {session_id}");
                    self.payments
                        .create(&NewPayment {
                            submission_id,
                            session_id: session_id.to_string(),
                            amount_cents: amount_cents.unwrap_or(0),
                            currency: "usd".into(),
                        })
                        .await?
                }
                None => {
                    warn!("completed checkout for unknown session {session_id}, dropping");
                    return Ok(());
                }
            },
        };
        if payment.status == PaymentStatus::Completed {
            return Ok(());
        }

        self.payments
            .set_status(
                payment.id,
                PaymentStatus::Completed,
                payment_intent_id,
                payer_email,
            )
            .await?;
        info!(
            "payment {} completed for submission {}",
            payment.id, payment.submission_id
        );

        let settings =
            ModerationSettings::from_pairs(self.settings.all().await?);
        self.advance_submission(
            &payment,
            LifecycleEvent::PaymentCompleted {
                requires_review: settings.promo_requires_review,
            },
        )
        .await
    }

    async fn expire(&self, session_id: &str) -> Result<(), DomainError> {
        let Some(payment) = self.payments.find_by_session(session_id).await? else {
            warn!("expired checkout for unknown session {session_id}, dropping");
            return Ok(());
        };
        if payment.status != PaymentStatus::Pending {
            return Ok(());
        }
        self.payments
            .set_status(payment.id, PaymentStatus::Failed, None, None)
            .await?;
        info!("payment {} expired", payment.id);
        self.advance_submission(&payment, LifecycleEvent::PaymentFailed)
            .await
    }

    /// Refunds only mark the payment; the submission keeps its status and an
    /// admin decides whether the post comes down.
    async fn refund(&self, payment_ref: &str) -> Result<(), DomainError> {
        let Some(payment) = self.payments.find_by_charge(payment_ref).await? else {
            warn!("refund for unknown payment {payment_ref}, dropping");
            return Ok(());
        };
        self.payments
            .set_status(payment.id, PaymentStatus::Refunded, None, None)
            .await?;
        info!(
            "payment {} refunded for submission {}",
            payment.id, payment.submission_id
        );
        Ok(())
    }

    async fn advance_submission(
        &self,
        payment: &PaymentRecord,
        event: LifecycleEvent,
    ) -> Result<(), DomainError> {
        let Some(submission) = self.submissions.find_by_id(payment.submission_id).await? else {
            warn!("payment {} references missing submission", payment.id);
            return Ok(());
        };
        // Late or duplicate webhook deliveries can find the submission past
        // payment_pending already; that is not an error worth retrying.
        if submission.status != SubmissionStatus::PaymentPending {
            return Ok(());
        }
        let next = transition(submission.status, event)?;
        self.submissions
            .set_status(submission.id, next, None)
            .await
    }
}
