use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::presentation::http::state::AppState;

/// Liveness and database reachability probe.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
    }))
}
