use anyhow::Result;
use dresswatch::api::rest::RestApi;
use dresswatch::config;
use dresswatch::db::repositories::review_logs::ReviewLogsRepository;
use dresswatch::db::DatabaseService;
use dresswatch::detection::{DetectionMonitor, DetectionPoller};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();
    info!("Starting dress-code violation monitor");

    let config_path = std::env::args().nth(1);
    let config = config::load_config(config_path.as_deref().map(Path::new))?;
    info!("Configuration loaded");

    // Durable storage for accepted violations
    let database = DatabaseService::new(&config.database).await?;
    let review_logs = ReviewLogsRepository::new(database.pool.clone());

    // Monitor owns the committed collection and every derived flag
    let monitor = Arc::new(DetectionMonitor::new(
        &config.detection,
        &config.alert,
        Some(config.cache.file_path()),
        Arc::new(review_logs.clone()),
    ));

    // Start polling the detection backend
    let poller = Arc::new(DetectionPoller::new(&config.detection, Arc::clone(&monitor))?);
    let poll_handle = Arc::clone(&poller).start();
    info!("Detection poller started");

    // REST surface consumed by the dashboard
    let api = RestApi::new(&config.api, Arc::clone(&monitor), review_logs)?;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api.run().await {
            error!("API server error: {}", e);
        }
    });

    // Wait for termination signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    // Cancelling the monitor stops the poller and any pending alert timers
    monitor.shutdown();
    let _ = poll_handle.await;
    api_handle.abort();

    Ok(())
}
