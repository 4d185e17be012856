pub mod api;
pub mod config;
pub mod db;
pub mod detection;
pub mod error;

// Re-export main components for easier use
pub use detection::{
    DetectionMessage,
    DetectionMonitor,
    DetectionPoller,
    DetectionState,
    IngestOutcome,
    ViolationEvent,
    ViolationSink,
};
pub use error::Error;
