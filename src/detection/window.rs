use crate::detection::event::ViolationEvent;
use chrono::{DateTime, Duration, Local};

/// Count the events whose timestamp falls within the trailing window ending
/// at `now`. Events with unparseable stamps are treated as not-recent.
pub fn recent_count(events: &[ViolationEvent], now: DateTime<Local>, window: Duration) -> usize {
    let cutoff = now - window;
    events
        .iter()
        .filter(|event| event.timestamp().map_or(false, |ts| ts >= cutoff))
        .count()
}
