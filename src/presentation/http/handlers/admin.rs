//! Admin surface: review queue, moderation controls, blacklist, settings,
//! payments and stats. Everything here sits behind the JWT middleware.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    domain::settings::ModerationSettings,
    domain::submission::lifecycle::SubmissionStatus,
    infrastructure::captioning::CaptionStyle,
    presentation::http::{errors::AppError, middleware::admin::AdminClaims, state::AppState},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<SubmissionStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_submissions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let submissions = state
        .submissions
        .list_by_status(
            query.status,
            query.limit.unwrap_or(50),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(json!({ "submissions": submissions })))
}

pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let submission = state
        .submissions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("submission {id}")))?;
    let log = state.moderation_logs.list_for_submission(id).await?;
    let payment = state.payments.find_by_submission(id).await?;
    Ok(Json(json!({
        "submission": submission,
        "moderation_log": log,
        "payment": payment,
    })))
}

#[derive(Debug, Deserialize, Default)]
pub struct ApproveRequest {
    /// Optional caption edit applied before approval.
    pub caption: Option<String>,
}

pub async fn approve_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<i64>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<Value>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let submission = state
        .review
        .approve(id, &claims.sub, body.caption.as_deref())
        .await?;
    Ok(Json(json!({ "submission": submission })))
}

pub async fn reject_submission(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let submission = state.review.reject(id, &claims.sub).await?;
    Ok(Json(json!({ "submission": submission })))
}

pub async fn publish_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let submission = state.review.publish(id).await?;
    Ok(Json(json!({ "submission": submission })))
}

/// Re-runs the full moderation pipeline and returns the fresh report.
pub async fn moderate_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let outcome = state.review.rerun_moderation(id).await?;
    Ok(Json(json!({
        "status": outcome.status,
        "flagged": outcome.flagged(),
        "score": outcome.report.score(),
        "outcomes": outcome.report.outcomes,
    })))
}

#[derive(Debug, Deserialize, Default)]
pub struct CaptionRequest {
    pub style: Option<String>,
}

pub async fn generate_caption(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<CaptionRequest>>,
) -> Result<Json<Value>, AppError> {
    let style = body
        .and_then(|Json(b)| b.style)
        .map(|s| s.parse::<CaptionStyle>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
        .unwrap_or_default();
    let caption = state.review.generate_caption(id, style).await?;
    Ok(Json(json!({ "caption": caption })))
}

// === Blacklist ===

pub async fn list_blacklist(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let entries = state.blacklist.list_all().await?;
    Ok(Json(json!({ "keywords": entries })))
}

#[derive(Debug, Deserialize)]
pub struct AddKeywordRequest {
    pub keyword: String,
    pub category: Option<String>,
}

pub async fn add_blacklist_keyword(
    State(state): State<AppState>,
    Json(body): Json<AddKeywordRequest>,
) -> Result<Json<Value>, AppError> {
    let keyword = body.keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("Keyword is required".into()));
    }
    let entry = state
        .blacklist
        .add(keyword, body.category.as_deref().unwrap_or("general"))
        .await?;
    Ok(Json(json!({ "keyword": entry })))
}

pub async fn delete_blacklist_keyword(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.blacklist.delete(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

pub async fn toggle_blacklist_keyword(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let is_active = state.blacklist.toggle(id).await?;
    Ok(Json(json!({ "id": id, "is_active": is_active })))
}

// === Settings ===

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let pairs = state.settings.all().await?;
    let effective = ModerationSettings::from_pairs(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );
    Ok(Json(json!({
        "raw": pairs.into_iter().collect::<std::collections::BTreeMap<_, _>>(),
        "effective": effective,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetSettingRequest {
    pub key: String,
    pub value: String,
}

pub async fn set_setting(
    State(state): State<AppState>,
    Json(body): Json<SetSettingRequest>,
) -> Result<Json<Value>, AppError> {
    let key = body.key.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("Setting key is required".into()));
    }
    state.settings.set(key, body.value.trim()).await?;
    Ok(Json(json!({ "key": key, "value": body.value.trim() })))
}

// === Payments and stats ===

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let payments = state
        .payments
        .list(query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(json!({ "payments": payments })))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let counts = state.submissions.status_counts().await?;
    let revenue_cents = state.payments.completed_total_cents().await?;
    let by_status: std::collections::BTreeMap<&'static str, i64> = counts
        .into_iter()
        .map(|(status, count)| (status.as_str(), count))
        .collect();
    Ok(Json(json!({
        "submissions": by_status,
        "revenue_cents": revenue_cents,
    })))
}
