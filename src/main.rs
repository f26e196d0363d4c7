//! Libris Server - Library Management System
//!
//! REST API server for library branches, books, members and loans.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use libris_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{overdue::OverdueSweeper, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("libris_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Libris Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), config.auth.clone());

    // Ensure the built-in admin account exists
    services.auth.seed_admin().await?;

    // Background overdue sweep with cooperative shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = OverdueSweeper::new(
        repository.clone(),
        Duration::from_secs(config.sweep.interval_secs),
        Duration::from_secs(config.sweep.retry_backoff_secs),
        shutdown_rx,
    );
    let sweeper_handle = tokio::spawn(sweeper.run());

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        repository,
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    // Stop the sweeper and wait for any in-flight pass to finish
    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/me", get(api::auth::me))
        // Users
        .route("/users", get(api::users::list_users))
        .route("/users/:id", get(api::users::get_user))
        .route("/users/:id", put(api::users::update_user))
        .route("/users/:id", delete(api::users::delete_user))
        // Branches
        .route("/branches", get(api::branches::list_branches))
        .route("/branches", post(api::branches::create_branch))
        .route("/branches/:id", get(api::branches::get_branch))
        .route("/branches/:id", put(api::branches::update_branch))
        .route("/branches/:id", delete(api::branches::delete_branch))
        // Books
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans", post(api::loans::create_loan))
        .route("/loans/my-history", get(api::loans::my_loan_history))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/history", get(api::loans::get_loan_history))
        .route("/loans/:id/status", patch(api::loans::update_loan_status))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
