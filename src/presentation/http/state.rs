use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    application::{
        moderate_submission::ModerationEngine, payment_events::PaymentEventsUseCase,
        review_submission::ReviewSubmissionUseCase, submit_content::SubmitContentUseCase,
    },
    config::Config,
    domain::submission::repository::{
        BlacklistRepository, ModerationLogRepository, PaymentRepository, SettingsRepository,
        SubmissionRepository,
    },
    infrastructure::storage::traits::StorageService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub storage: Arc<dyn StorageService>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub blacklist: Arc<dyn BlacklistRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub moderation_logs: Arc<dyn ModerationLogRepository>,
    pub engine: Arc<ModerationEngine>,
    pub submit: Arc<SubmitContentUseCase>,
    pub review: Arc<ReviewSubmissionUseCase>,
    pub payment_events: Arc<PaymentEventsUseCase>,
}
