use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Notification sound hook, invoked when the alert banner is raised
#[async_trait]
pub trait AlertSound: Send + Sync {
    async fn play(&self) -> Result<()>;
}

/// Plays the cue by spawning a configured player command
pub struct CommandSound {
    command: String,
}

impl CommandSound {
    pub fn new(command: String) -> Self {
        Self { command }
    }
}

#[async_trait]
impl AlertSound for CommandSound {
    async fn play(&self) -> Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::Audio("Empty sound command".to_string()))?;

        let status = tokio::process::Command::new(program)
            .args(parts)
            .status()
            .await
            .map_err(|e| Error::Audio(format!("Failed to spawn sound player: {}", e)))?;

        if !status.success() {
            return Err(Error::Audio(format!("Sound player exited with {}", status)).into());
        }

        Ok(())
    }
}

/// A boolean flag that auto-clears a fixed duration after it was last raised.
///
/// Raising the flag again restarts the clock rather than stacking a second
/// dismissal: each raise bumps a generation counter and the timer task only
/// clears the flag if no later raise happened in the meantime. All timer
/// tasks exit when the owning scope's cancellation token fires.
#[derive(Clone)]
pub struct TransientFlag {
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    duration: Duration,
    cancel: CancellationToken,
}

impl TransientFlag {
    pub fn new(duration: Duration, cancel: CancellationToken) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            duration,
            cancel,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Raise the flag and (re)start the auto-clear timer
    pub fn raise(&self) {
        self.active.store(true, Ordering::SeqCst);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let active = Arc::clone(&self.active);
        let latest = Arc::clone(&self.generation);
        let cancel = self.cancel.clone();
        let duration = self.duration;

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    // Only the most recent raise may clear the flag
                    if latest.load(Ordering::SeqCst) == generation {
                        active.store(false, Ordering::SeqCst);
                    }
                }
            }
        });
    }

    /// Explicitly clear the flag, invalidating any pending auto-clear
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Fire-and-forget playback, never surfaced as an error to the caller
pub fn play_detached(sound: Arc<dyn AlertSound>) {
    tokio::spawn(async move {
        if let Err(e) = sound.play().await {
            warn!("Alert sound playback failed: {}", e);
        }
    });
}
