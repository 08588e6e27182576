use anyhow::Context as _;

use bookshelf_api::{
    api::{create_router, AppState},
    config::Config,
};

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = Config::from_env()?;

    // Catalog and curated table problems stop startup here
    let state = AppState::from_config(&config)
        .await
        .context("initialize application state")?;

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("bind {}", address))?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app).await.context("serve")?;

    Ok(())
}
