use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::submission::entity::Submission,
    presentation::http::{errors::AppError, state::AppState},
};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
}

/// Public view of a published submission. Submitter contact details and
/// moderation internals never leave the admin surface.
#[derive(Debug, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub caption: String,
    pub image_url: String,
    pub extra_image_urls: Vec<String>,
    pub video_url: Option<String>,
    pub submitter_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<Submission> for FeedItem {
    fn from(s: Submission) -> Self {
        FeedItem {
            id: s.id,
            caption: s.caption,
            image_url: format!("/media/{}", s.image_path),
            extra_image_urls: s
                .extra_images
                .iter()
                .map(|p| format!("/media/{p}"))
                .collect(),
            video_url: s.video_path.map(|p| format!("/media/{p}")),
            submitter_name: s.submitter_name,
            published_at: s.published_at,
        }
    }
}

/// Published posts, newest first.
pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedItem>>, AppError> {
    let submissions = state
        .submissions
        .list_published(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(submissions.into_iter().map(FeedItem::from).collect()))
}
