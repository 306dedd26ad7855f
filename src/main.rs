mod app;
mod config;
mod db;
mod error;
mod forms;
mod images;
mod posts;
mod routes;
mod state;
mod storage;
mod users;
mod views;

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "timeline=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = state::AppState::init().await?;
    let _sweeper = state.previews.spawn_sweeper(state.config.preview_ttl);

    app::serve(app::build_app(state)).await
}
