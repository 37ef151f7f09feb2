use fortune_server::config::{AppState, Config};
use fortune_server::create_router;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_file()?;
    let state = AppState::from_config(&config)?;
    info!("Using {} model {}", state.provider, state.model_name);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
