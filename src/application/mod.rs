pub mod moderate_submission;
pub mod payment_events;
pub mod review_submission;
pub mod submit_content;
