use std::{sync::Arc, time::Duration};

use cinebrain_api::{
    config::Config,
    graph::{GraphStore, SurrealClient},
    routes::{create_router, AppState},
};
use tracing_subscriber::EnvFilter;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinebrain_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Wait for the graph store before accepting traffic
    let client = SurrealClient::new(&config)?;
    client
        .connect_with_retry(CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY)
        .await?;
    tracing::info!(store = client.name(), "Graph store ready");

    let state = AppState::new(Arc::new(client), &config);
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
