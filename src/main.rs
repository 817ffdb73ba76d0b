use screenshot_catalog::{bind_listener, build_router, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let config = Config::from_env();
    telemetry::init_tracing(config.log_json);

    let state = AppState::new(config.clone());
    state.images.ensure_dir().await?;
    tracing::info!(
        uploads = %state.images.dir().display(),
        ai_tagging = state.tagger.is_enabled(),
        "catalog ready"
    );
    tracing::info!("Authentication is disabled - all users can add and remove screenshots");

    let listener = bind_listener(&config).await?;
    tracing::info!("serving on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await
}
