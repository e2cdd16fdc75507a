use promob_budget::{api, create_pool, AppConfig, IngestService, LocalObjectStore, PgStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let service = Arc::new(IngestService::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(LocalObjectStore::new(&config.storage.root)),
        config.pricing.clone(),
        config.ingest.clone(),
    ));

    let app = api::create_router(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/promob/process          - ingest an uploaded Promob XML");
    info!("  GET  /api/budgets/:id             - budget with line items");
    info!("  GET  /api/budgets/:id/items.csv   - line items as CSV");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
