//! Monitoring Loop Implementation

use crate::config::{InspectionMode, MonitorConfig};
use crate::sink::{DisplaySink, LogSink};
use crate::MonitorError;
use alerting::NotificationGate;
use camera_capture::{CameraError, FrameSource, VideoFrame};
use inspector::{duration_from_secs, Cadence, PendingInspection, PeriodicInspector, Probe, Reading};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vision::{
    Emotion, EmotionConfig, EyeClosureEstimator, EyeDistanceEstimator, FaceLandmarker, FaceLandmarks,
    GeminiPostureClassifier, Lighting, NoFaceLandmarker, OnnxEmotionClassifier, PostureConfig,
    PostureLabel, PresenceDetector,
};
use vitals::{BlinkAccumulator, CurrentSignals, PresenceTracker};

/// Counters over the lifetime of a loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    /// Ticks that processed a frame
    pub ticks: u64,
    /// Ticks skipped because no frame could be acquired
    pub skipped_ticks: u64,
    /// Notifications sent to the sink
    pub notifications: u64,
    /// Blinks registered
    pub blinks: u64,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was processed
    Processed { notifications: usize },
    /// Frame acquisition failed; nothing changed
    Skipped,
    /// The source has no more frames
    EndOfStream,
}

/// Per-frame landmark outcome
enum FaceObservation {
    Found(FaceLandmarks),
    NotFound,
    Failed,
}

/// Result of a background inspection, applied on a later tick
enum InspectionResult {
    Posture(Reading<PostureLabel>),
    Emotion(Reading<Emotion>),
}

/// Which inspector a background task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InspectionKind {
    Posture,
    Emotion,
}

impl InspectionKind {
    fn as_str(&self) -> &'static str {
        match self {
            InspectionKind::Posture => "posture",
            InspectionKind::Emotion => "emotion",
        }
    }
}

/// Assembles a [`MonitoringLoop`] from injected collaborators
pub struct MonitorBuilder {
    config: MonitorConfig,
    source: Option<Box<dyn FrameSource>>,
    landmarker: Option<Box<dyn FaceLandmarker>>,
    presence: Option<Box<dyn PresenceDetector>>,
    posture: Option<Arc<dyn Probe<Output = PostureLabel>>>,
    emotion: Option<Arc<dyn Probe<Output = Emotion>>>,
    sink: Option<Box<dyn DisplaySink>>,
}

impl MonitorBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            source: None,
            landmarker: None,
            presence: None,
            posture: None,
            emotion: None,
            sink: None,
        }
    }

    pub fn source(mut self, source: impl FrameSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn landmarker(mut self, landmarker: impl FaceLandmarker + 'static) -> Self {
        self.landmarker = Some(Box::new(landmarker));
        self
    }

    /// Without one, presence means "face landmarks found"
    pub fn presence_detector(mut self, detector: impl PresenceDetector + 'static) -> Self {
        self.presence = Some(Box::new(detector));
        self
    }

    pub fn posture_probe(mut self, probe: Arc<dyn Probe<Output = PostureLabel>>) -> Self {
        self.posture = Some(probe);
        self
    }

    pub fn emotion_probe(mut self, probe: Arc<dyn Probe<Output = Emotion>>) -> Self {
        self.emotion = Some(probe);
        self
    }

    pub fn sink(mut self, sink: impl DisplaySink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Construct the posture and emotion probes described by the config.
    ///
    /// A probe without a credential or model path is left out and its signal
    /// stays unknown.
    pub fn with_configured_probes(mut self) -> Result<Self, MonitorError> {
        if self.posture.is_none() {
            self.posture = posture_from_config(&self.config.posture)?;
        }
        if self.emotion.is_none() {
            self.emotion = emotion_from_config(&self.config.emotion)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Result<MonitoringLoop, MonitorError> {
        self.build_at(Instant::now())
    }

    /// Build with an explicit start time (warm-up and blink windows count from it)
    pub fn build_at(self, started_at: Instant) -> Result<MonitoringLoop, MonitorError> {
        let mut source = self.source.ok_or(MonitorError::MissingSource)?;
        if !source.is_open() {
            source.open()?;
        }

        let config = self.config;
        let cadence = &config.cadence;
        let probe_timeout = Duration::from_millis(cadence.probe_timeout_ms);

        let posture = self.posture.map(|probe| {
            PeriodicInspector::new(probe, duration_from_secs(cadence.posture_secs), probe_timeout)
        });
        let emotion = self.emotion.map(|probe| {
            PeriodicInspector::new(probe, duration_from_secs(cadence.emotion_secs), probe_timeout)
        });

        let (signals_tx, _) = watch::channel(CurrentSignals::default());
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        info!(
            tick_ms = config.tick_interval_ms,
            mode = ?config.inspection_mode,
            posture = posture.is_some(),
            emotion = emotion.is_some(),
            "Monitoring loop assembled"
        );

        Ok(MonitoringLoop {
            source,
            landmarker: self.landmarker.unwrap_or_else(|| Box::new(NoFaceLandmarker)),
            presence_detector: self.presence,
            sink: self.sink.unwrap_or_else(|| Box::new(LogSink::new())),
            eyes: EyeClosureEstimator::new(),
            distance: EyeDistanceEstimator::new(config.distance.clone()),
            distance_cadence: Cadence::every_secs(cadence.eye_distance_secs),
            lighting_cadence: Cadence::every_secs(cadence.lighting_secs),
            posture,
            emotion,
            blink: BlinkAccumulator::new(config.blink.clone(), started_at),
            presence: PresenceTracker::new(config.presence.clone()),
            gate: NotificationGate::new(config.gate.clone(), started_at),
            signals: CurrentSignals::default(),
            signals_tx,
            results_tx,
            results_rx,
            background: Vec::new(),
            mode: config.inspection_mode,
            tick_interval: config.tick_interval(),
            stats: MonitorStats::default(),
        })
    }
}

fn posture_from_config(
    config: &PostureConfig,
) -> Result<Option<Arc<dyn Probe<Output = PostureLabel>>>, MonitorError> {
    if !config.is_enabled() {
        info!("Posture probe disabled: no api_key configured");
        return Ok(None);
    }
    let probe: Arc<dyn Probe<Output = PostureLabel>> = Arc::new(GeminiPostureClassifier::new(config)?);
    Ok(Some(probe))
}

fn emotion_from_config(
    config: &EmotionConfig,
) -> Result<Option<Arc<dyn Probe<Output = Emotion>>>, MonitorError> {
    match OnnxEmotionClassifier::from_config(config)? {
        Some(classifier) => {
            let probe: Arc<dyn Probe<Output = Emotion>> = Arc::new(classifier);
            Ok(Some(probe))
        }
        None => {
            info!("Emotion probe disabled: no model_path configured");
            Ok(None)
        }
    }
}

/// Orchestrates detectors, timing state and notifications once per tick.
///
/// Owns the current signals; the display sink and watch subscribers only
/// ever see copies.
pub struct MonitoringLoop {
    source: Box<dyn FrameSource>,
    landmarker: Box<dyn FaceLandmarker>,
    presence_detector: Option<Box<dyn PresenceDetector>>,
    sink: Box<dyn DisplaySink>,

    eyes: EyeClosureEstimator,
    distance: EyeDistanceEstimator,
    distance_cadence: Cadence,
    lighting_cadence: Cadence,
    posture: Option<PeriodicInspector<PostureLabel>>,
    emotion: Option<PeriodicInspector<Emotion>>,

    blink: BlinkAccumulator,
    presence: PresenceTracker,
    gate: NotificationGate,

    signals: CurrentSignals,
    signals_tx: watch::Sender<CurrentSignals>,
    results_tx: mpsc::UnboundedSender<InspectionResult>,
    results_rx: mpsc::UnboundedReceiver<InspectionResult>,
    background: Vec<(InspectionKind, JoinHandle<()>)>,

    mode: InspectionMode,
    tick_interval: Duration,
    stats: MonitorStats,
}

impl MonitoringLoop {
    /// Latest signals
    pub fn signals(&self) -> &CurrentSignals {
        &self.signals
    }

    /// Receive a copy of the signals after every processed tick
    pub fn subscribe(&self) -> watch::Receiver<CurrentSignals> {
        self.signals_tx.subscribe()
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one tick at the current time
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Run one tick at `now`
    pub async fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let frame = match self.source.read_frame() {
            Ok(frame) => frame,
            Err(CameraError::EndOfStream) => return TickOutcome::EndOfStream,
            Err(e) => {
                warn!(error = %e, "Frame acquisition failed, skipping tick");
                self.stats.skipped_ticks += 1;
                return TickOutcome::Skipped;
            }
        };

        self.apply_background_results().await;

        let face = self.observe_face(&frame, now);
        self.run_cheap_checks(&frame, &face, now);
        self.run_inspections(&frame, now).await;

        self.signals.sequence = frame.sequence;
        self.signals.present = self.presence.is_present();
        self.signals.blink_rate_bpm = self.blink.rate_bpm().into();
        self.signals.total_blinks = self.blink.total_blinks();
        self.signals.sitting_seconds = self.presence.current_session_seconds(now);

        let notifications = self.gate.evaluate(&self.signals, now);
        for notification in &notifications {
            self.sink.show_notification(notification);
        }
        self.stats.notifications += notifications.len() as u64;

        self.signals_tx.send_replace(self.signals.clone());
        self.sink.publish(&self.signals, &frame);

        self.stats.ticks += 1;
        TickOutcome::Processed {
            notifications: notifications.len(),
        }
    }

    /// Landmarks, blink and presence for one frame
    fn observe_face(&mut self, frame: &VideoFrame, now: Instant) -> FaceObservation {
        let face = match self.landmarker.detect(frame) {
            Ok(Some(landmarks)) => FaceObservation::Found(landmarks),
            Ok(None) => FaceObservation::NotFound,
            Err(e) => {
                warn!(error = %e, "Landmark detection failed");
                FaceObservation::Failed
            }
        };

        if let FaceObservation::Found(landmarks) = &face {
            if let Some(ear) = self.eyes.average_ear(landmarks) {
                if let Some(event) = self.blink.observe(ear) {
                    debug!(total = event.total, closed_frames = event.closed_frames, "Blink");
                    self.stats.blinks += 1;
                }
            }
        }

        let face_visible = matches!(face, FaceObservation::Found(_));
        let present = match self.presence_detector.as_mut() {
            Some(detector) => detector.is_present(frame).unwrap_or_else(|e| {
                warn!(error = %e, "Presence detection failed, using face visibility");
                face_visible
            }),
            None => face_visible,
        };
        self.presence.observe(present, now);

        if let Some(rate) = self.blink.maybe_finalize_window(now) {
            debug!(rate_bpm = rate, "Blink rate updated");
        }

        face
    }

    /// Eye distance and lighting on their own cadences
    fn run_cheap_checks(&mut self, frame: &VideoFrame, face: &FaceObservation, now: Instant) {
        if self.distance_cadence.ready(now) {
            self.signals.eye_distance_cm = match face {
                FaceObservation::Found(landmarks) => self.distance.estimate(landmarks).into(),
                FaceObservation::NotFound => Reading::Unknown,
                FaceObservation::Failed => Reading::Unavailable,
            };
        }

        if self.lighting_cadence.ready(now) {
            self.signals.lighting = Lighting::from_frame(frame).into();
        }
    }

    async fn run_inspections(&mut self, frame: &VideoFrame, now: Instant) {
        match self.mode {
            InspectionMode::Inline => {
                if let Some(inspector) = self.posture.as_mut() {
                    if let Some(reading) = inspector.maybe_run(now, frame).await {
                        self.signals.posture = reading;
                    }
                }
                if let Some(inspector) = self.emotion.as_mut() {
                    if let Some(reading) = inspector.maybe_run(now, frame).await {
                        self.signals.emotion = reading;
                    }
                }
            }
            InspectionMode::Background => {
                if let Some(pending) = self.posture.as_mut().and_then(|i| i.try_begin(now)) {
                    self.spawn_inspection(
                        InspectionKind::Posture,
                        pending,
                        frame.clone(),
                        InspectionResult::Posture,
                    );
                }
                if let Some(pending) = self.emotion.as_mut().and_then(|i| i.try_begin(now)) {
                    self.spawn_inspection(
                        InspectionKind::Emotion,
                        pending,
                        frame.clone(),
                        InspectionResult::Emotion,
                    );
                }
            }
        }
    }

    fn spawn_inspection<T: Send + 'static>(
        &mut self,
        kind: InspectionKind,
        pending: PendingInspection<T>,
        frame: VideoFrame,
        wrap: fn(Reading<T>) -> InspectionResult,
    ) {
        let tx = self.results_tx.clone();
        let handle = tokio::spawn(async move {
            let reading = pending.run(&frame).await;
            // Receiver gone means the loop shut down
            let _ = tx.send(wrap(reading));
        });
        self.background.push((kind, handle));
    }

    /// Apply finished background inspections; only fresh results overwrite signals.
    ///
    /// A task that died without reporting (a panicking probe) degrades its
    /// signal and frees the inspector for its next cadence.
    async fn apply_background_results(&mut self) {
        while let Ok(result) = self.results_rx.try_recv() {
            match result {
                InspectionResult::Posture(reading) => {
                    if let Some(inspector) = self.posture.as_mut() {
                        inspector.finish(&reading);
                    }
                    self.signals.posture = reading;
                }
                InspectionResult::Emotion(reading) => {
                    if let Some(inspector) = self.emotion.as_mut() {
                        inspector.finish(&reading);
                    }
                    self.signals.emotion = reading;
                }
            }
        }

        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.background)
            .into_iter()
            .partition(|(_, handle)| handle.is_finished());
        self.background = running;

        for (kind, handle) in finished {
            if let Err(e) = handle.await {
                warn!(inspection = kind.as_str(), error = %e, "Background inspection died, signal degraded");
                self.fail_inspection(kind);
            }
        }
    }

    fn fail_inspection(&mut self, kind: InspectionKind) {
        match kind {
            InspectionKind::Posture => {
                if let Some(inspector) = self.posture.as_mut() {
                    inspector.finish(&Reading::Unavailable);
                }
                self.signals.posture = Reading::Unavailable;
            }
            InspectionKind::Emotion => {
                if let Some(inspector) = self.emotion.as_mut() {
                    inspector.finish(&Reading::Unavailable);
                }
                self.signals.emotion = Reading::Unavailable;
            }
        }
    }

    /// Tick until cancelled or the stream ends, then release the source
    pub async fn run(&mut self, cancel: CancellationToken) -> MonitorStats {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Monitoring started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Monitoring cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    if self.tick().await == TickOutcome::EndOfStream {
                        info!("Frame stream ended");
                        break;
                    }
                }
            }
        }

        self.shutdown();
        info!(
            ticks = self.stats.ticks,
            skipped = self.stats.skipped_ticks,
            notifications = self.stats.notifications,
            blinks = self.stats.blinks,
            "Monitoring stopped"
        );
        self.stats.clone()
    }

    /// Close the source and abandon outstanding inspections
    pub fn shutdown(&mut self) {
        for (_, handle) in self.background.drain(..) {
            handle.abort();
        }
        self.source.close();
    }
}

impl Drop for MonitoringLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
