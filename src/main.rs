use soapbox::{
    application::{
        moderate_submission::ModerationEngine, payment_events::PaymentEventsUseCase,
        review_submission::ReviewSubmissionUseCase, submit_content::SubmitContentUseCase,
    },
    config::Config,
    domain::moderation::profanity::{ProfanityLexicon, WordListLexicon},
    infrastructure::{
        captioning::gemini::GeminiCaptionGenerator,
        database::create_pool,
        payments::stripe::StripeCheckout,
        publishing::graph_publisher::GraphApiPublisher,
        repositories::{
            SqlxBlacklistRepository, SqlxModerationLogRepository, SqlxPaymentRepository,
            SqlxSettingsRepository, SqlxSubmissionRepository,
        },
        storage::local_storage_service::LocalStorageService,
    },
    presentation::http::{routes::create_router, state::AppState},
};

use axum::extract::DefaultBodyLimit;
use http::{HeaderValue, Method, header};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,soapbox=debug,tower_http=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    let db = create_pool(&config.database_url, config.database_max_connections).await?;
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(config.ignore_missing_migrations);
    migrator.run(&db).await?;

    let storage = Arc::new(LocalStorageService::new(config.upload_dir.clone()));
    let submissions = Arc::new(SqlxSubmissionRepository::new(db.clone()));
    let payments = Arc::new(SqlxPaymentRepository::new(db.clone()));
    let blacklist = Arc::new(SqlxBlacklistRepository::new(db.clone()));
    let settings = Arc::new(SqlxSettingsRepository::new(db.clone()));
    let moderation_logs = Arc::new(SqlxModerationLogRepository::new(db.clone()));

    let publisher = Arc::new(GraphApiPublisher::new(
        config.graph_api_base.clone(),
        config.publisher_access_token.clone(),
        config.publisher_account_id.clone(),
        config.image_host_api_key.clone(),
    ));
    let captioner = Arc::new(GeminiCaptionGenerator::new(config.caption_api_key.clone()));
    let checkout = Arc::new(StripeCheckout::new(config.checkout_secret_key.clone()));

    let engine = Arc::new(ModerationEngine::new(
        submissions.clone(),
        moderation_logs.clone(),
        blacklist.clone(),
        settings.clone(),
        Some(Box::new(WordListLexicon::builtin()) as Box<dyn ProfanityLexicon>),
    ));
    let submit = Arc::new(SubmitContentUseCase::new(
        submissions.clone(),
        payments.clone(),
        blacklist.clone(),
        engine.clone(),
        storage.clone(),
        publisher.clone(),
        captioner.clone(),
        checkout.clone(),
        Some(Box::new(WordListLexicon::builtin()) as Box<dyn ProfanityLexicon>),
        config.public_base_url.clone(),
    ));
    let review = Arc::new(ReviewSubmissionUseCase::new(
        submissions.clone(),
        payments.clone(),
        engine.clone(),
        storage.clone(),
        publisher.clone(),
        captioner.clone(),
    ));
    let payment_events = Arc::new(PaymentEventsUseCase::new(
        submissions.clone(),
        payments.clone(),
        settings.clone(),
    ));

    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        storage,
        submissions,
        payments,
        blacklist,
        settings,
        moderation_logs,
        engine,
        submit,
        review,
        payment_events,
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let app = create_router(state)
        .nest_service("/media", ServeDir::new(&config.upload_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, initiating graceful shutdown");
        }
    }
}
