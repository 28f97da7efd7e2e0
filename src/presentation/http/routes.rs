use super::{
    handlers::{admin, auth, feed, health, submit, webhook},
    middleware::admin::require_admin,
    middleware::request_id::request_id_middleware,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/v1/admin/submissions", get(admin::list_submissions))
        .route("/api/v1/admin/submissions/{id}", get(admin::get_submission))
        .route(
            "/api/v1/admin/submissions/{id}/approve",
            post(admin::approve_submission),
        )
        .route(
            "/api/v1/admin/submissions/{id}/reject",
            post(admin::reject_submission),
        )
        .route(
            "/api/v1/admin/submissions/{id}/publish",
            post(admin::publish_submission),
        )
        .route(
            "/api/v1/admin/submissions/{id}/moderate",
            post(admin::moderate_submission),
        )
        .route(
            "/api/v1/admin/submissions/{id}/caption",
            post(admin::generate_caption),
        )
        .route(
            "/api/v1/admin/blacklist",
            get(admin::list_blacklist).post(admin::add_blacklist_keyword),
        )
        .route(
            "/api/v1/admin/blacklist/{id}",
            delete(admin::delete_blacklist_keyword),
        )
        .route(
            "/api/v1/admin/blacklist/{id}/toggle",
            post(admin::toggle_blacklist_keyword),
        )
        .route(
            "/api/v1/admin/settings",
            get(admin::get_settings).put(admin::set_setting),
        )
        .route("/api/v1/admin/payments", get(admin::list_payments))
        .route("/api/v1/admin/stats", get(admin::get_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Public surface
        .route("/api/v1/submissions", post(submit::submit))
        .route("/api/v1/feed", get(feed::feed))
        // Payment provider webhook (signature-verified, unauthenticated)
        .route("/api/v1/webhooks/payment", post(webhook::payment_webhook))
        // Admin login (unprotected)
        .route("/api/v1/admin/login", post(auth::login))
        // Admin (protected by JWT middleware)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
