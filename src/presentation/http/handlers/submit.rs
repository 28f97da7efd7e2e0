use axum::{
    Json,
    extract::{Multipart, State},
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::{
    application::submit_content::{MediaUpload, SubmitContentInput},
    domain::submission::entity::PostType,
    presentation::http::{errors::AppError, state::AppState},
};

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}

/// Public submission endpoint. Multipart fields: `caption`, `post_type`,
/// optional `name` and `email`, one or more `images`, optional `video`.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut caption = String::new();
    let mut post_type = PostType::Free;
    let mut name = None;
    let mut email = None;
    let mut images = Vec::new();
    let mut video = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("Field error".into()))?
    {
        match field.name().unwrap_or("") {
            "caption" => caption = field.text().await.unwrap_or_default(),
            "post_type" => {
                post_type = PostType::parse_lenient(&field.text().await.unwrap_or_default());
            }
            "name" => name = Some(field.text().await.unwrap_or_default()),
            "email" => email = Some(field.text().await.unwrap_or_default()),
            "images" | "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Byte error".into()))?;
                images.push(MediaUpload { filename, data });
            }
            "video" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|_| AppError::BadRequest("Byte error".into()))?;
                if !data.is_empty() {
                    video = Some(MediaUpload { filename, data });
                }
            }
            _ => {}
        }
    }

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let output = state
        .submit
        .execute(SubmitContentInput {
            submitter_name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            submitter_email: email
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty()),
            submitter_ip: extract_client_ip(&headers),
            user_agent,
            caption,
            post_type,
            images,
            video,
        })
        .await?;

    Ok(Json(json!({
        "id": output.submission.id,
        "status": output.submission.status,
        "checkout_url": output.checkout_url,
        "published": output.published,
    })))
}
