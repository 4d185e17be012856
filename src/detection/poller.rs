use crate::config::DetectionConfig;
use crate::detection::event::DetectionMessage;
use crate::detection::monitor::{DetectionMonitor, IngestOutcome};
use crate::error::Error;
use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Polls the detection status endpoint at a fixed cadence and hands new
/// violation payloads to the monitor. A failed tick is logged and skipped;
/// the loop never stops on its own, only via the monitor's cancellation.
pub struct DetectionPoller {
    endpoint: Url,
    interval: Duration,
    client: reqwest::Client,
    monitor: Arc<DetectionMonitor>,
}

impl DetectionPoller {
    pub fn new(config: &DetectionConfig, monitor: Arc<DetectionMonitor>) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| Error::Config(format!("Invalid detection endpoint: {}", e)))?;

        Ok(Self {
            endpoint,
            interval: Duration::from_millis(config.poll_interval_ms),
            client: reqwest::Client::new(),
            monitor,
        })
    }

    /// Start the poll loop in the background
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let cancel = self.monitor.cancellation_token();

        tokio::spawn(async move {
            info!(
                "Starting detection poller ({} every {}ms)",
                self.endpoint,
                self.interval.as_millis()
            );

            let mut interval = tokio::time::interval(self.interval);
            let mut last_violation_id: Option<String> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Detection poller stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = self.poll_once(&mut last_violation_id).await {
                            // Transient by assumption, the next tick retries
                            debug!("Detection poll skipped: {}", e);
                        }
                    }
                }
            }
        })
    }

    async fn poll_once(&self, last_violation_id: &mut Option<String>) -> Result<()> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| Error::Http(format!("Detection request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "Detection endpoint returned {}",
                response.status()
            ))
            .into());
        }

        let message: DetectionMessage = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Malformed detection payload: {}", e)))?;

        match message.message_type.as_str() {
            "feed_init" => self.monitor.mark_feed_initialized(),
            "violation" => {
                let Some(event) = message.data else {
                    return Ok(());
                };
                if event.violation_id.is_empty() {
                    return Ok(());
                }
                // Cheap short-circuit before the full membership check
                if last_violation_id.as_deref() == Some(event.violation_id.as_str()) {
                    return Ok(());
                }

                let violation_id = event.violation_id.clone();
                match self.monitor.ingest(event).await {
                    // Invalid payloads advance the marker too, so a stuck
                    // malformed event isn't re-reported every tick
                    IngestOutcome::Committed
                    | IngestOutcome::Duplicate
                    | IngestOutcome::Invalid => {
                        *last_violation_id = Some(violation_id);
                    }
                    // Persistence may be back next tick, leave the marker so
                    // the same id is retried
                    IngestOutcome::Rejected => {}
                }
            }
            other => debug!("Ignoring detection message type {:?}", other),
        }

        Ok(())
    }
}
