//! Display layer boundary

use alerting::Notification;
use camera_capture::VideoFrame;
use tracing::{debug, info};
use vitals::CurrentSignals;

/// Receives notifications and signal snapshots from the loop.
///
/// Render-only: implementations get shared references and cannot feed
/// anything back into monitoring state.
pub trait DisplaySink: Send {
    fn show_notification(&mut self, notification: &Notification);

    fn publish(&mut self, signals: &CurrentSignals, frame: &VideoFrame);
}

/// Sink that writes everything to the tracing output
#[derive(Debug)]
pub struct LogSink {
    /// Only every n-th snapshot is logged
    every: u64,
    published: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::every(100)
    }

    pub fn every(n: u64) -> Self {
        Self {
            every: n.max(1),
            published: 0,
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for LogSink {
    fn show_notification(&mut self, notification: &Notification) {
        info!(
            category = %notification.category,
            "{}: {}",
            notification.title,
            notification.message
        );
    }

    fn publish(&mut self, signals: &CurrentSignals, frame: &VideoFrame) {
        self.published += 1;
        if self.published % self.every != 0 {
            return;
        }
        let values = signals
            .named_values()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        debug!(sequence = frame.sequence, "{}", values);
    }
}
