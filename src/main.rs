use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use hawwa::api::api_router;
use hawwa::config::{self, Config};
use hawwa::core_state::AppState;
use hawwa::db;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = Config::from_env();

    // An unusable store at startup is unrecoverable: abort, don't limp.
    if let Some(parent) = config.db_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(path = %parent.display(), error = %e, "cannot create data directory");
            std::process::exit(1);
        }
    }
    if let Err(e) = db::open_store(&config.db_path) {
        tracing::error!(path = %config.db_path.display(), error = %e, "cannot open record store");
        std::process::exit(1);
    }

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState::new(config));
    let app = api_router(state);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%bind_addr, error = %e, "cannot bind API address");
            std::process::exit(1);
        }
    };
    tracing::info!("listening on http://{bind_addr}");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
