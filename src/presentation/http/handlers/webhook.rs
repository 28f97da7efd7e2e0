use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::warn;

use crate::{
    infrastructure::payments::webhook::{DEFAULT_TOLERANCE_SECS, parse_event, verify_signature},
    presentation::http::{errors::AppError, state::AppState},
};

/// Payment provider webhook. The signature is verified against the raw body
/// before any parsing; events the pipeline does not react to are acknowledged
/// so the provider stops retrying them.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let secret = state
        .config
        .checkout_webhook_secret
        .as_deref()
        .ok_or_else(|| AppError::ExternalService("webhook secret not configured".into()))?;
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".into()))?;

    verify_signature(
        &body,
        signature,
        secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
    .map_err(|e| {
        warn!("webhook signature rejected: {e}");
        AppError::Forbidden("Invalid webhook signature".into())
    })?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid webhook payload".into()))?;

    if let Some(event) = parse_event(&payload) {
        state.payment_events.apply(event).await?;
    }
    Ok(Json(json!({ "received": true })))
}
