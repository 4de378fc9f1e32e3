//! Per-Frame Vital Signals
//!
//! Timing state carried across frames:
//! - Blink detection and blink-rate windows
//! - Sitting stopwatch with break-reset semantics
//! - The current-signals snapshot shared with alerting and display

pub mod blink;
pub mod presence;
pub mod signals;

pub use blink::{BlinkAccumulator, BlinkConfig, BlinkEvent};
pub use presence::{PresenceConfig, PresenceTracker};
pub use signals::CurrentSignals;
