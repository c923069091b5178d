use tracing_subscriber::EnvFilter;

use reelfeed::api::{create_router, AppState};
use reelfeed::config::Config;
use reelfeed::services::InMemoryCatalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelfeed=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => InMemoryCatalog::from_json_file(path)?,
        None => {
            let mut catalog = InMemoryCatalog::new();
            catalog.add_region(&config.default_region);
            catalog
        }
    };

    let state = AppState::with_catalog(catalog);
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(%address, "Feed server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
