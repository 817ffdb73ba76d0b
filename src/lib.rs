pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod storage;
pub mod tagging;
pub mod telemetry;
pub mod uploads;
pub mod validation;

pub use config::Config;
pub use storage::{MemStorage, SharedStorage};

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::io;
use std::sync::Arc;
use tagging::TagGenerator;
use tokio::net::TcpListener;
use uploads::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub storage: SharedStorage,
    pub images: ImageStore,
    pub tagger: Arc<TagGenerator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let storage = if config.seed_samples {
            MemStorage::with_samples()
        } else {
            MemStorage::new()
        };
        let tagger = TagGenerator::from_config(&config);
        Self::with_parts(config, storage, tagger)
    }

    pub fn with_parts(config: Config, storage: MemStorage, tagger: TagGenerator) -> Self {
        Self {
            storage: storage.into_shared(),
            images: ImageStore::new(config.uploads_dir.clone()),
            tagger: Arc::new(tagger),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route(
            "/api/screenshots",
            get(handlers::list_screenshots).post(handlers::create_screenshot),
        )
        .route("/api/screenshots/search", get(handlers::search_screenshots))
        .route("/api/screenshots/filter", get(handlers::filter_screenshots))
        .route(
            "/api/screenshots/:id",
            get(handlers::get_screenshot)
                .patch(handlers::update_screenshot)
                .delete(handlers::delete_screenshot),
        )
        .route("/api/options", get(handlers::catalog_options))
        .route("/api/user", get(handlers::current_user))
        .route("/api/register", post(handlers::register_user))
        .route("/api/login", post(handlers::login_user))
        .route("/uploads/:name", get(handlers::serve_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(telemetry::request_logging))
        .with_state(state)
}

/// Binds the configured port, moving on to the next candidate while ports are taken.
pub async fn bind_listener(config: &Config) -> io::Result<TcpListener> {
    let mut last_err = None;
    for port in config.candidate_ports() {
        match TcpListener::bind((config.host.as_str(), port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                tracing::warn!(port, "port in use, trying next port");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no available ports found")
    }))
}
