use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kringle_draw::{DrawConfig, DrawOrchestrator, DrawStore, MemoryDrawStore, PgDrawStore};
use kringle_notify::{EmailConfig, Notifier, SmtpNotifier, UnconfiguredNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kringle_api::config::ServerConfig;
use kringle_api::router::build_app_router;
use kringle_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kringle_api=debug,kringle_draw=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let draw_config = DrawConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        notify_on_draw = config.notify_on_draw,
        notify_concurrency = draw_config.notify_concurrency,
        "Loaded server configuration"
    );

    // --- Store ---
    let store: Arc<dyn DrawStore> = match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = kringle_db::create_pool(&database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            kringle_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            kringle_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgDrawStore::new(pool))
        }
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, using an empty in-memory store; events cannot be \
                 created over HTTP, so draw routes answer 404 until one is configured"
            );
            Arc::new(MemoryDrawStore::new())
        }
    };

    // --- Notifier ---
    let notifier: Arc<dyn Notifier> = match EmailConfig::from_env() {
        Some(email_config) => {
            let smtp = SmtpNotifier::new(&email_config).expect("Invalid SMTP configuration");
            tracing::info!(
                smtp_host = %email_config.smtp_host,
                smtp_port = email_config.smtp_port,
                "SMTP delivery configured"
            );
            Arc::new(smtp)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, assignment notifications will be recorded as failed");
            Arc::new(UnconfiguredNotifier)
        }
    };

    // --- App state ---
    let orchestrator = Arc::new(DrawOrchestrator::new(store, notifier, draw_config));
    let state = AppState {
        orchestrator,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let server_shutdown = Arc::clone(&shutdown);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.notified().await })
            .await
    });

    tokio::select! {
        result = &mut server => {
            match result {
                Ok(Ok(())) => tracing::info!("Server stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "Server error"),
                Err(e) => tracing::error!(error = %e, "Server task failed"),
            }
            return;
        }
        () = shutdown_signal() => {}
    }

    // --- Drain ---
    shutdown.notify_one();
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    match tokio::time::timeout(drain, server).await {
        Ok(_) => tracing::info!("Graceful shutdown complete"),
        Err(_) => tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Shutdown timed out, dropping in-flight requests"
        ),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
