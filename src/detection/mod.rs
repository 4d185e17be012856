pub mod alert;
pub mod event;
pub mod monitor;
pub mod poller;
pub mod store;
pub mod window;


pub use event::{DetectionMessage, ViolationEvent};
pub use monitor::{DetectionMonitor, DetectionState, IngestOutcome, ViolationSink};
pub use poller::DetectionPoller;
