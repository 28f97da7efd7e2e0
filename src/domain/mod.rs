pub mod moderation;
pub mod payment;
pub mod settings;
pub mod submission;
