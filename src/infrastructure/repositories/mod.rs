pub mod sqlx_blacklist_repository;
pub mod sqlx_moderation_log_repository;
pub mod sqlx_payment_repository;
pub mod sqlx_settings_repository;
pub mod sqlx_submission_repository;

pub use sqlx_blacklist_repository::SqlxBlacklistRepository;
pub use sqlx_moderation_log_repository::SqlxModerationLogRepository;
pub use sqlx_payment_repository::SqlxPaymentRepository;
pub use sqlx_settings_repository::SqlxSettingsRepository;
pub use sqlx_submission_repository::SqlxSubmissionRepository;
