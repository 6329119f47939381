//! Sweater server entry point.

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use sweater_api::{middleware::AppState, router as api_router};
use sweater_common::{Config, LocalStorage};
use sweater_core::{
    AccountService, Argon2Hasher, DbAccountStore, MessageService, NoOpNotificationGateway,
    NotificationGatewayService, SmtpNotificationGateway, SubscriptionService,
};
use sweater_db::repositories::{MessageRepository, SubscriptionRepository, UserRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound for request bodies, attachments included.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sweater=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting sweater server...");

    // Load configuration
    let config = Config::load()?;

    let db = sweater_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    sweater_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));

    let notifier: NotificationGatewayService = match &config.mail {
        Some(mail) => {
            info!(host = %mail.host, "Outgoing mail enabled");
            Arc::new(SmtpNotificationGateway::new(mail)?)
        }
        None => {
            warn!("No mail configuration, activation emails will not be sent");
            Arc::new(NoOpNotificationGateway)
        }
    };

    let store = Arc::new(DbAccountStore::new(user_repo, subscription_repo));
    let storage = Arc::new(LocalStorage::new(
        config.upload.path.clone(),
        config.upload.base_url.clone(),
    ));

    let state = AppState {
        account_service: AccountService::new(
            store.clone(),
            Arc::new(Argon2Hasher),
            notifier,
            &config,
        ),
        subscription_service: SubscriptionService::new(store, &config),
        message_service: MessageService::new(message_repo, storage),
    };

    let app = Router::new()
        .nest("/api", api_router())
        .nest_service(&config.upload.base_url, ServeDir::new(&config.upload.path))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            sweater_api::middleware::auth_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
