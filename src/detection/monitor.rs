use crate::config::{AlertConfig, DetectionConfig};
use crate::detection::alert::{self, AlertSound, CommandSound, TransientFlag};
use crate::detection::event::ViolationEvent;
use crate::detection::store::ViolationStore;
use crate::detection::window::recent_count;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Durable append-only destination for accepted violations
#[async_trait]
pub trait ViolationSink: Send + Sync {
    async fn append(&self, event: &ViolationEvent) -> Result<()>;
}

/// Outcome of handing a candidate event to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New event, durably stored and now visible
    Committed,
    /// Id was already committed, nothing happened
    Duplicate,
    /// Payload missing required fields, dropped for good
    Invalid,
    /// Persistence failure, nothing visible changed; safe to retry
    Rejected,
}

/// Snapshot of the detection state exposed to presentation clients
#[derive(Debug, Clone, Serialize)]
pub struct DetectionState {
    pub violations: Vec<ViolationEvent>,
    pub is_detecting: bool,
    pub is_feed_initialized: bool,
    pub show_alert: bool,
    pub hourly_violations: usize,
}

/// Owns the committed violation collection and every piece of state derived
/// from it. Single writer: all commits go through `ingest`, readers get
/// consistent snapshots via `state`.
pub struct DetectionMonitor {
    store: RwLock<ViolationStore>,
    sink: Arc<dyn ViolationSink>,
    sound: Option<Arc<dyn AlertSound>>,
    show_alert: TransientFlag,
    is_detecting: TransientFlag,
    feed_initialized: AtomicBool,
    hourly: AtomicUsize,
    window: chrono::Duration,
    cancel: CancellationToken,
}

impl DetectionMonitor {
    pub fn new(
        detection: &DetectionConfig,
        alert_config: &AlertConfig,
        cache_path: Option<PathBuf>,
        sink: Arc<dyn ViolationSink>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let display = Duration::from_millis(alert_config.display_ms);
        let window = chrono::Duration::minutes(detection.window_minutes);

        let store = ViolationStore::new(cache_path);
        // The count is normally recomputed on acceptance; seed it from the
        // hydrated cache so a restart doesn't show zero until the next event
        let hourly = recent_count(store.events(), Local::now(), window);
        if !store.is_empty() {
            info!("Hydrated {} cached violations ({} in window)", store.len(), hourly);
        }

        let sound = alert_config
            .sound_command
            .as_ref()
            .map(|command| Arc::new(CommandSound::new(command.clone())) as Arc<dyn AlertSound>);

        Self {
            store: RwLock::new(store),
            sink,
            sound,
            show_alert: TransientFlag::new(display, cancel.child_token()),
            is_detecting: TransientFlag::new(display, cancel.child_token()),
            feed_initialized: AtomicBool::new(false),
            hourly: AtomicUsize::new(hourly),
            window,
            cancel,
        }
    }

    /// Token handed to background tasks owned by this monitor's lifetime
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Deduplicate and commit a candidate event.
    ///
    /// The durable write happens before any visible state changes, so the
    /// visible collection is always a subset of what the database holds.
    pub async fn ingest(&self, event: ViolationEvent) -> IngestOutcome {
        if !event.is_complete() {
            warn!("Dropping incomplete violation payload (id: {:?})", event.violation_id);
            return IngestOutcome::Invalid;
        }

        {
            let store = self.store.read().await;
            if store.contains(&event.violation_id) {
                debug!("Violation {} already committed", event.violation_id);
                return IngestOutcome::Duplicate;
            }
        }

        self.is_detecting.raise();

        if let Err(e) = self.sink.append(&event).await {
            // Skip the visible commit so the UI never shows an event the
            // database doesn't have
            error!("Failed to persist violation {}: {}", event.violation_id, e);
            return IngestOutcome::Rejected;
        }

        let violation_id = event.violation_id.clone();
        let (hourly, cache) = {
            let mut store = self.store.write().await;
            if !store.commit(event) {
                return IngestOutcome::Duplicate;
            }
            (
                recent_count(store.events(), Local::now(), self.window),
                store.cache_snapshot(),
            )
        };
        self.hourly.store(hourly, Ordering::SeqCst);

        // Mirror to the local cache outside the store lock
        if let Some((path, json)) = cache {
            if let Err(e) = tokio::fs::write(&path, json).await {
                warn!("Failed to write violation cache {}: {}", path.display(), e);
            }
        }

        info!("New violation {} committed ({} in the last hour)", violation_id, hourly);

        self.show_alert.raise();
        if let Some(sound) = &self.sound {
            alert::play_detached(Arc::clone(sound));
        }

        IngestOutcome::Committed
    }

    /// Current state snapshot for presentation clients
    pub async fn state(&self) -> DetectionState {
        let store = self.store.read().await;
        DetectionState {
            violations: store.events().to_vec(),
            is_detecting: self.is_detecting.is_active(),
            is_feed_initialized: self.feed_initialized.load(Ordering::SeqCst),
            show_alert: self.show_alert.is_active(),
            hourly_violations: self.hourly.load(Ordering::SeqCst),
        }
    }

    /// User dismissed the alert banner
    pub fn dismiss_alert(&self) {
        self.show_alert.clear();
    }

    pub fn mark_feed_initialized(&self) {
        if !self.feed_initialized.swap(true, Ordering::SeqCst) {
            info!("Detection feed initialized");
        }
    }

    /// Stop every timer task owned by this monitor
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for DetectionMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
