//! Periodic Inspector Implementation

use crate::{Cadence, Probe, ProbeError, Reading};
use camera_capture::VideoFrame;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A probe gated by its own cadence and bounded by a timeout.
///
/// At most one run is in flight at a time; while a run is pending the
/// inspector is never due.
pub struct PeriodicInspector<T> {
    /// The wrapped check
    probe: Arc<dyn Probe<Output = T>>,
    /// Spacing between runs
    cadence: Cadence,
    /// Upper bound on a single run
    timeout: Duration,
    /// Whether a run has started and not finished
    in_flight: bool,
    /// Completed runs
    runs: u64,
    /// Runs that ended in `Reading::Unavailable`
    failures: u64,
}

impl<T: Send + 'static> PeriodicInspector<T> {
    /// Create a new inspector
    pub fn new(probe: Arc<dyn Probe<Output = T>>, interval: Duration, timeout: Duration) -> Self {
        Self {
            probe,
            cadence: Cadence::new(interval),
            timeout,
            in_flight: false,
            runs: 0,
            failures: 0,
        }
    }

    /// Name of the wrapped probe
    pub fn name(&self) -> &'static str {
        self.probe.name()
    }

    /// Whether a new run may start at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        !self.in_flight && self.cadence.is_due(now)
    }

    /// Start a run if one is due. The cadence is measured from run start.
    pub fn try_begin(&mut self, now: Instant) -> Option<PendingInspection<T>> {
        if !self.is_due(now) {
            return None;
        }
        self.cadence.mark(now);
        self.in_flight = true;
        debug!("Starting {} inspection", self.probe.name());

        Some(PendingInspection {
            probe: Arc::clone(&self.probe),
            timeout: self.timeout,
        })
    }

    /// Record the outcome of a run started with [`try_begin`](Self::try_begin)
    pub fn finish(&mut self, reading: &Reading<T>) {
        self.in_flight = false;
        self.runs += 1;
        if reading.is_unavailable() {
            self.failures += 1;
        }
    }

    /// Run inline when due; `None` means not due (keep the previous value)
    pub async fn maybe_run(&mut self, now: Instant, frame: &VideoFrame) -> Option<Reading<T>> {
        let pending = self.try_begin(now)?;
        let reading = pending.run(frame).await;
        self.finish(&reading);
        Some(reading)
    }

    /// Whether a run is pending
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Completed runs
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Runs that degraded to `Unavailable`
    pub fn failures(&self) -> u64 {
        self.failures
    }
}

/// A started run, detached from the inspector so it can move to a task
pub struct PendingInspection<T> {
    probe: Arc<dyn Probe<Output = T>>,
    timeout: Duration,
}

impl<T: Send + 'static> PendingInspection<T> {
    /// Name of the probe being run
    pub fn name(&self) -> &'static str {
        self.probe.name()
    }

    /// Execute the probe; errors and timeouts become `Reading::Unavailable`
    pub async fn run(self, frame: &VideoFrame) -> Reading<T> {
        let name = self.probe.name();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.timeout, self.probe.probe(frame)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(value) => {
                debug!(probe = name, latency_ms = started.elapsed().as_millis() as u64, "Inspection completed");
                Reading::from(value)
            }
            Err(e) => {
                warn!(probe = name, error = %e, "Inspection failed, signal degraded");
                Reading::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProbe {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Probe for CountingProbe {
        type Output = u32;

        fn name(&self) -> &'static str {
            "counting"
        }

        async fn probe(&self, _frame: &VideoFrame) -> Result<Option<u32>, ProbeError> {
            Ok(Some(self.calls.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl Probe for FailingProbe {
        type Output = u32;

        fn name(&self) -> &'static str {
            "failing"
        }

        async fn probe(&self, _frame: &VideoFrame) -> Result<Option<u32>, ProbeError> {
            Err(ProbeError::Network("connection refused".into()))
        }
    }

    struct SlowProbe;

    #[async_trait]
    impl Probe for SlowProbe {
        type Output = u32;

        fn name(&self) -> &'static str {
            "slow"
        }

        async fn probe(&self, _frame: &VideoFrame) -> Result<Option<u32>, ProbeError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(1))
        }
    }

    struct BlindProbe;

    #[async_trait]
    impl Probe for BlindProbe {
        type Output = u32;

        fn name(&self) -> &'static str {
            "blind"
        }

        async fn probe(&self, _frame: &VideoFrame) -> Result<Option<u32>, ProbeError> {
            Ok(None)
        }
    }

    fn frame() -> VideoFrame {
        VideoFrame::filled(4, 4, [0, 0, 0])
    }

    #[tokio::test]
    async fn test_runs_only_when_due() {
        let probe: Arc<dyn Probe<Output = u32>> = Arc::new(CountingProbe { calls: AtomicU32::new(0) });
        let mut inspector = PeriodicInspector::new(probe, Duration::from_secs(30), Duration::from_secs(5));
        let t0 = Instant::now();

        assert_eq!(inspector.maybe_run(t0, &frame()).await, Some(Reading::Value(1)));
        assert_eq!(inspector.maybe_run(t0 + Duration::from_secs(10), &frame()).await, None);
        assert_eq!(
            inspector.maybe_run(t0 + Duration::from_secs(30), &frame()).await,
            Some(Reading::Value(2))
        );
        assert_eq!(inspector.runs(), 2);
    }

    #[tokio::test]
    async fn test_failure_maps_to_unavailable() {
        let mut inspector =
            PeriodicInspector::<u32>::new(Arc::new(FailingProbe), Duration::from_secs(1), Duration::from_secs(5));
        let t0 = Instant::now();

        for i in 0..5 {
            let reading = inspector.maybe_run(t0 + Duration::from_secs(i), &frame()).await;
            assert_eq!(reading, Some(Reading::Unavailable));
        }
        assert_eq!(inspector.failures(), 5);
    }

    #[tokio::test]
    async fn test_no_reading_maps_to_unknown() {
        let mut inspector =
            PeriodicInspector::<u32>::new(Arc::new(BlindProbe), Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(inspector.maybe_run(Instant::now(), &frame()).await, Some(Reading::Unknown));
        assert_eq!(inspector.failures(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_maps_to_unavailable() {
        let mut inspector =
            PeriodicInspector::<u32>::new(Arc::new(SlowProbe), Duration::from_secs(1), Duration::from_secs(3));
        let reading = inspector.maybe_run(Instant::now(), &frame()).await;
        assert_eq!(reading, Some(Reading::Unavailable));
        assert!(!inspector.in_flight());
    }

    #[test]
    fn test_single_run_in_flight() {
        let probe: Arc<dyn Probe<Output = u32>> = Arc::new(CountingProbe { calls: AtomicU32::new(0) });
        let mut inspector = PeriodicInspector::new(probe, Duration::from_secs(1), Duration::from_secs(5));
        let t0 = Instant::now();

        let pending = inspector.try_begin(t0);
        assert!(pending.is_some());
        assert!(inspector.in_flight());
        assert!(inspector.try_begin(t0 + Duration::from_secs(10)).is_none());

        inspector.finish(&Reading::Value(1));
        assert!(inspector.try_begin(t0 + Duration::from_secs(10)).is_some());
    }
}
