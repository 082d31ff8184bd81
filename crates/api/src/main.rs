use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deckforge_api::auth::jwt::JwtKeys;
use deckforge_api::background::{dispatcher::QueueDispatcher, token_cleanup};
use deckforge_api::config::ServerConfig;
use deckforge_api::router::build_app_router;
use deckforge_api::services::seed::{seed_users, CardImporter};
use deckforge_api::state::AppState;
use deckforge_coord::{CoordStore, RedisStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deckforge_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Arc::new(ServerConfig::from_env());
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- JWT keys ---
    let jwt = Arc::new(JwtKeys::load(&config.jwt));
    tracing::info!("JWT key pair loaded");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = deckforge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    deckforge_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    deckforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Coordination store ---
    // The connection manager reconnects on its own after transient
    // outages; locks fail open and the cache degrades to direct reads
    // while it is down.
    let store: Arc<dyn CoordStore> = Arc::new(
        RedisStore::connect(&config.redis_url)
            .await
            .expect("Failed to connect to coordination store"),
    );
    tracing::info!(url = %config.redis_url, "Coordination store connected");

    // --- App state ---
    let state = AppState::build(pool.clone(), Arc::clone(&config), jwt, store);

    // --- Seeding ---
    seed_users(&pool).await.expect("Failed to seed users");
    CardImporter::new(pool.clone(), &config.card_source_url)
        .run_if_empty()
        .await;

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let dispatcher = QueueDispatcher::new(Arc::clone(&state.queue), Arc::clone(&state.cache));
    let dispatcher_cancel = cancel.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_cancel).await;
    });

    let cleanup_handle = tokio::spawn(token_cleanup::run(pool.clone(), cancel.clone()));

    tracing::info!("Background tasks started (dispatcher, token cleanup)");

    // --- Router ---
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

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
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
