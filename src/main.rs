use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use molaire::state::AppState;
use molaire::{api, config, db};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::Settings::from_env();

    // Run migrations up front so a broken schema fails the boot, not the
    // first request.
    if let Err(e) = db::open_database(&settings.database_path) {
        tracing::error!(error = %e, path = %settings.database_path.display(), "Database setup failed");
        std::process::exit(1);
    }

    let bind_addr = settings.bind_addr;
    let state = match AppState::new(settings) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!(error = %e, "Upload storage setup failed");
            std::process::exit(1);
        }
    };

    let app = api::api_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("cannot bind HTTP listener");
    tracing::info!(%bind_addr, "Listening");
    axum::serve(listener, app).await.expect("server error");
}
