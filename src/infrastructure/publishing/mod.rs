//! Publishing collaborator boundary.
//!
//! The core never talks to the social network directly: it hands a
//! [`PublishRequest`] to a [`Publisher`] and reacts to the typed result.
//! Failures carry a kind and message; the core does not retry.

pub mod graph_publisher;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Everything the publisher needs for one post.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Cover image bytes
    pub image: Vec<u8>,
    /// Final caption text
    pub caption: String,
    /// Additional images, in order, for a carousel post
    pub extra_images: Vec<Vec<u8>>,
    /// Video bytes; takes precedence over images when present
    pub video: Option<Vec<u8>>,
}

/// Successful publication.
#[derive(Debug, Clone)]
pub struct PublishedPost {
    /// External post identifier
    pub post_id: String,
    /// Publicly hosted media URL used for the post, when one was created
    pub media_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publisher not configured")]
    NotConfigured,
    #[error("publisher API error: {0}")]
    Api(String),
    #[error("publisher transport error: {0}")]
    Transport(String),
    #[error("media processing timed out: {0}")]
    Timeout(String),
    #[error("invalid publish request: {0}")]
    InvalidRequest(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn publish(&self, request: PublishRequest) -> Result<PublishedPost, PublishError>;
}
