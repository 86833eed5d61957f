use race_flow::{AppState, Config, load_snapshot, router};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let store = config.open_store().await?;
    info!(backend = store.backend_name(), "store ready");

    let snapshot = match load_snapshot(store.as_ref()).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!("initial load failed, starting empty: {err}");
            Default::default()
        }
    };
    let app = router(AppState::new(store, snapshot));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
