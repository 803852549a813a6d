//! Scan session state machine
//!
//! A session owns the capture stream for exactly as long as it is
//! `Capturing`. Every way a capture can end (duration reached, `stop()`,
//! cancellation, device loss) goes through the same finalize step, which drops
//! the stream and with it the microphone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jiff::Timestamp;
use thiserror::Error;

use super::input::AudioError;
use crate::bands::BandTable;
use crate::config::ScanConfig;
use crate::outcome::{Notice, ScanOutcome};
use crate::report::{assemble, AnalysisResult, ClassificationPolicy};
use crate::spectrum::{AggregatedSpectrum, BandEnergyAggregator, SpectrumFrame};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// Permission denied, no device, device busy, or lost before the first frame
    #[error("Microphone unavailable: {0}")]
    Unavailable(String),

    /// Device lost after capture began
    #[error("Capture interrupted: {0}")]
    Interrupted(String),
}

impl From<AudioError> for CaptureError {
    fn from(err: AudioError) -> Self {
        CaptureError::Unavailable(err.to_string())
    }
}

/// Source of capture streams, usually a microphone
pub trait CaptureDevice {
    type Stream: FrameStream;

    /// Acquire the device exclusively
    ///
    /// The returned stream holds the device until it is dropped.
    fn acquire(&mut self) -> Result<Self::Stream, CaptureError>;
}

/// An open capture producing spectrum frames
pub trait FrameStream {
    fn sample_rate(&self) -> f64;

    fn bin_count(&self) -> usize;

    /// Audio samples behind each frame
    fn samples_per_frame(&self) -> usize;

    /// Next available frame
    ///
    /// `Ok(None)` means nothing is ready yet. An error means the device is gone
    /// and no further frames will arrive.
    fn next_frame(&mut self) -> Result<Option<SpectrumFrame>, CaptureError>;
}

/// Process-wide exclusivity for one physical device
///
/// Clones share the same flag. At most one [`DeviceClaim`] exists per lock at
/// any time; dropping the claim frees the device for the next session.
#[derive(Debug, Clone, Default)]
pub struct DeviceLock(Arc<AtomicBool>);

impl DeviceLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the device, or `None` while another claim is alive
    pub fn try_claim(&self) -> Option<DeviceClaim> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DeviceClaim(Arc::clone(&self.0)))
    }

    /// Take the device or fail the way a busy microphone does
    pub fn claim(&self, device: &str) -> Result<DeviceClaim, CaptureError> {
        self.try_claim()
            .ok_or_else(|| CaptureError::Unavailable(format!("{} in use", device)))
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held for as long as a stream owns its device
#[derive(Debug)]
pub struct DeviceClaim(Arc<AtomicBool>);

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Shared cancellation flag
///
/// Clones observe the same flag, so a caller can keep one and hand the other
/// to the session.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Completed,
    Errored,
}

/// Frames needed to cover `duration_ms` of audio, at least one
pub fn frame_limit(duration_ms: u64, sample_rate: f64, samples_per_frame: usize) -> u64 {
    if samples_per_frame == 0 || !(sample_rate > 0.0) {
        return 1;
    }
    let samples = duration_ms as f64 * sample_rate / 1000.0;
    ((samples / samples_per_frame as f64).ceil() as u64).max(1)
}

/// One bounded capture-to-report lifecycle
pub struct ScanSession<D: CaptureDevice> {
    device: D,
    table: BandTable,
    policy: ClassificationPolicy,
    duration_limit_ms: u64,
    cancel: CancelToken,

    state: SessionState,
    started_at: Option<Timestamp>,
    stream: Option<D::Stream>,
    aggregator: Option<BandEnergyAggregator>,
    frame_limit: u64,
    interruption: Option<CaptureError>,
    error: Option<CaptureError>,
    result: Option<AnalysisResult>,
}

impl<D: CaptureDevice> ScanSession<D> {
    pub fn new(device: D, config: &ScanConfig) -> Self {
        Self::with_cancel_token(device, config, CancelToken::new())
    }

    pub fn with_cancel_token(device: D, config: &ScanConfig, cancel: CancelToken) -> Self {
        Self {
            device,
            table: config.table(),
            policy: config.policy,
            duration_limit_ms: config.duration_limit_ms,
            cancel,
            state: SessionState::Idle,
            started_at: None,
            stream: None,
            aggregator: None,
            frame_limit: 0,
            interruption: None,
            error: None,
            result: None,
        }
    }

    /// Acquire the device and begin capturing
    ///
    /// A no-op while already capturing. A finished session is reset and a new
    /// scan begins. On failure no frames are produced and the session stays
    /// `Idle`.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == SessionState::Capturing {
            return Ok(());
        }

        self.reset();

        let stream = match self.device.acquire() {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("Scan could not start: {}", err);
                return Err(match err {
                    CaptureError::Interrupted(msg) => CaptureError::Unavailable(msg),
                    unavailable => unavailable,
                });
            }
        };

        let sample_rate = stream.sample_rate();
        let bin_count = stream.bin_count();
        self.frame_limit = frame_limit(self.duration_limit_ms, sample_rate, stream.samples_per_frame());
        self.aggregator = Some(BandEnergyAggregator::new(self.table, sample_rate, bin_count));
        self.stream = Some(stream);
        self.started_at = Some(Timestamp::now());
        self.state = SessionState::Capturing;

        log::info!(
            "Scan started: {} Hz, {} bins, {} frames",
            sample_rate,
            bin_count,
            self.frame_limit
        );

        Ok(())
    }

    /// Drain every frame the stream has ready
    ///
    /// Also observes cancellation and device loss. Returns the state afterwards.
    pub fn pump(&mut self) -> SessionState {
        while self.state == SessionState::Capturing {
            if self.cancel.is_cancelled() {
                log::debug!("Scan cancelled");
                self.finalize();
                break;
            }

            let Some(stream) = self.stream.as_mut() else {
                self.finalize();
                break;
            };

            match stream.next_frame() {
                Ok(Some(frame)) => {
                    self.on_frame(frame);
                }
                Ok(None) => break,
                Err(err) => {
                    log::warn!("{}; finishing with captured frames", err);
                    self.interruption = Some(err);
                    self.finalize();
                }
            }
        }

        self.state
    }

    /// Fold one frame into the session
    ///
    /// Frames arriving outside `Capturing` or with the wrong shape are
    /// discarded. Returns whether the frame was used.
    pub fn on_frame(&mut self, frame: SpectrumFrame) -> bool {
        if self.state != SessionState::Capturing {
            log::debug!("Discarding frame outside an open session");
            return false;
        }

        let Some(aggregator) = self.aggregator.as_mut() else {
            return false;
        };

        if let Err(err) = aggregator.push(&frame) {
            log::warn!("Discarding frame: {}", err);
            return false;
        }

        if aggregator.frame_count() >= self.frame_limit {
            self.finalize();
        }

        true
    }

    /// End the capture early
    ///
    /// Idempotent: a second call, or a call after the session finished on its
    /// own, changes nothing.
    pub fn stop(&mut self) -> SessionState {
        if self.state == SessionState::Capturing {
            self.finalize();
        }
        self.state
    }

    fn finalize(&mut self) {
        if self.state != SessionState::Capturing {
            return;
        }

        // Releases the device
        drop(self.stream.take());

        // Losing the device before the first frame leaves nothing to report.
        // A stop or cancel before the first frame still completes, with the
        // empty-session report.
        let frames = self.frame_count();
        if frames == 0 {
            if let Some(err) = &self.interruption {
                log::warn!("Scan failed before any audio arrived: {}", err);
                self.error = Some(CaptureError::Unavailable(err.to_string()));
                self.state = SessionState::Errored;
                return;
            }
        }

        let spectrum = self
            .aggregator
            .as_ref()
            .map(|agg| agg.spectrum().clone());
        if let Some(spectrum) = spectrum {
            self.result = Some(assemble(&spectrum, &self.table, &self.policy));
        }

        log::info!(
            "Scan completed with {} of {} frames{}",
            frames,
            self.frame_limit,
            if self.interruption.is_some() { " (interrupted)" } else { "" }
        );
        self.state = SessionState::Completed;
    }

    fn reset(&mut self) {
        self.stream = None;
        self.aggregator = None;
        self.started_at = None;
        self.frame_limit = 0;
        self.interruption = None;
        self.error = None;
        self.result = None;
        self.cancel.reset();
        self.state = SessionState::Idle;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn duration_limit_ms(&self) -> u64 {
        self.duration_limit_ms
    }

    /// Frames the duration limit allows for the current capture
    pub fn frame_limit(&self) -> u64 {
        self.frame_limit
    }

    pub fn frame_count(&self) -> u64 {
        self.aggregator.as_ref().map_or(0, |agg| agg.frame_count())
    }

    pub fn aggregated(&self) -> Option<&AggregatedSpectrum> {
        self.aggregator.as_ref().map(|agg| agg.spectrum())
    }

    /// Running per-band means of the current capture, in table order
    pub fn band_energies(&self) -> Option<&[f64]> {
        self.aggregator.as_ref().map(|agg| agg.band_energies())
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// True while the session holds the capture device
    pub fn holds_device(&self) -> bool {
        self.stream.is_some()
    }

    /// Completed with partial data after the device went away
    pub fn is_degraded(&self) -> bool {
        self.state == SessionState::Completed && self.interruption.is_some()
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Result plus any capture notice, once the session has completed
    pub fn outcome(&self) -> Option<ScanOutcome> {
        let result = self.result.clone()?;
        let mut outcome = ScanOutcome::new(result);
        if let Some(err) = &self.interruption {
            outcome.push_notice(Notice::CaptureInterrupted(err.to_string()));
        }
        Some(outcome)
    }
}
