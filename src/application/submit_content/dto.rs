use bytes::Bytes;
use serde::Serialize;

use crate::domain::submission::entity::{PostType, Submission};

/// One uploaded file as received from the multipart form. The body stays in
/// the `Bytes` the extractor produced, so cloning an upload never copies it.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub data: Bytes,
}

/// Everything the intake flow needs for one submission.
#[derive(Debug, Clone)]
pub struct SubmitContentInput {
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub submitter_ip: Option<String>,
    pub user_agent: Option<String>,
    pub caption: String,
    pub post_type: PostType,
    /// First image is the cover; the rest become carousel items.
    pub images: Vec<MediaUpload>,
    pub video: Option<MediaUpload>,
}

/// Intake result returned to the submitter.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitContentOutput {
    pub submission: Submission,
    /// Hosted checkout URL; present only for promotional submissions.
    pub checkout_url: Option<String>,
    /// True when the auto-publish policy already pushed the post live.
    pub published: bool,
}
