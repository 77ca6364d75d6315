//! Documentation of a book review platform.
//!
//! Readers browse a catalog, open a book page with its aggregated rating, write and like
//! reviews, and keep a profile.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server, JSON over HTTP under `/api`
//! - Storage chosen at startup: in-memory tables (default) or Redis
//! - Frontend talks to the server directly, CORS open for the REST verbs it uses
//!
//!
//!
//! # Ratings
//!
//! A book carries **averageRating** and **totalReviews** so listings never aggregate on read.
//!
//! - Every review create, edit and delete rebuilds the aggregate of each book it touched
//! - Rebuilt from the book's full review set, not nudged up or down
//! - Average is rounded to one decimal, halves up
//! - A review edit that moves the review to another book rebuilds both books
//!
//!
//!
//! # Catalog
//!
//! `GET /api/books` filters, ranks and slices in process:
//! - `search`: case-insensitive substring of title, author or description
//! - `genre`: exact match
//! - `page` (default 1), `limit` (default 12, at most 100)
//! - Ranked by rating, best first
//!
//! `GET /api/genres` counts books per genre, largest first.
//!
//!
//!
//! # Setup
//!
//! Environment.
//! ```sh
//! RUST_PORT=5000          # listen port
//! STORAGE=memory          # or redis
//! REDIS_URL=redis://127.0.0.1:6379
//! SEED_SAMPLE_DATA=true   # memory backend only
//! RUST_LOG=info
//! ```
//!
//! Optional secret `/run/secrets/REDIS_PASSWORD`.
//!
//! Run.
//! ```sh
//! cargo run -p shelf
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::sync::Arc;

use axum::{
    Router,
    http::{
        Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod memory;
pub mod routes;
pub mod sample;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use routes::{
    book_handler, books_handler, create_book_handler, create_review_handler, create_user_handler,
    delete_review_handler, featured_books_handler, genres_handler, health_handler,
    like_review_handler, reviews_handler, update_review_handler, update_user_handler,
    user_handler,
};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .max_age(state.config.cors_max_age);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/books", get(books_handler).post(create_book_handler))
        .route("/api/books/featured", get(featured_books_handler))
        .route("/api/books/{id}", get(book_handler))
        .route("/api/reviews", get(reviews_handler).post(create_review_handler))
        .route(
            "/api/reviews/{id}",
            put(update_review_handler).delete(delete_review_handler),
        )
        .route("/api/reviews/{id}/like", post(like_review_handler))
        .route("/api/users", post(create_user_handler))
        .route("/api/users/{id}", get(user_handler).put(update_user_handler))
        .route("/api/genres", get(genres_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
