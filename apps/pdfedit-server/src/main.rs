//! pdfedit Server
//!
//! Serves a small upload form and a JSON API around `pdfedit-core`:
//!
//! - `GET /` renders the form (`?pairs=N` picks the number of replacement rows)
//! - `POST /edit` takes the multipart form and returns `edited_document.pdf`
//! - `POST /api/edit` takes base64 JSON and returns base64 JSON with metrics
//! - `GET /health` for liveness checks
//!
//! Documents are held in memory for the duration of one request only.

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdfedit_core::EditOptions;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod form;

/// Command-line arguments for the pdfedit server
#[derive(Parser, Debug)]
#[command(name = "pdfedit-server")]
#[command(about = "Upload form and JSON API for PDF text and image substitution")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PDFEDIT_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFEDIT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Largest accepted request body in megabytes
    #[arg(long, env = "PDFEDIT_MAX_UPLOAD_MB", default_value = "25")]
    max_upload_mb: usize,

    /// Compress streams of edited documents
    #[arg(long, env = "PDFEDIT_COMPRESS")]
    compress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Engine defaults; JSON requests may override `compress`
    pub options: EditOptions,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Browser form
        .route("/", get(form::handle_form))
        .route("/edit", post(form::handle_form_submit))
        // API endpoints
        .route("/api/edit", post(api::handle_edit))
        // Health check
        .route("/health", get(api::handle_health))
        // Apply middleware
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfedit server on {}:{}", args.host, args.port);

    let state = AppState {
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        options: EditOptions {
            compress: args.compress,
        },
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
