//! Scripted capture device
//!
//! Feeds prerecorded frames through the normal session path. Used to re-run a
//! stored scan and to drive sessions without hardware.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::session::{CaptureDevice, CaptureError, DeviceClaim, DeviceLock, FrameStream};
use crate::spectrum::SpectrumFrame;

#[derive(Debug, Default)]
struct Counters {
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    lock: DeviceLock,
}

/// Acquire/release counts of a [`ReplayDevice`], readable after the device has
/// moved into a session
///
/// Clones of one device share these counts and one exclusivity lock, like two
/// sessions pointed at the same microphone.
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe(Arc<Counters>);

impl DeviceProbe {
    pub fn acquisitions(&self) -> usize {
        self.0.acquisitions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.0.releases.load(Ordering::SeqCst)
    }

    /// Streams acquired and not yet dropped
    pub fn open_streams(&self) -> usize {
        self.acquisitions() - self.releases()
    }
}

#[derive(Debug, Clone)]
pub struct ReplayDevice {
    sample_rate: f64,
    bin_count: usize,
    frames: Vec<SpectrumFrame>,
    fail_after: Option<usize>,
    per_pump: Option<usize>,
    unavailable: bool,
    probe: DeviceProbe,
}

impl ReplayDevice {
    pub fn new(sample_rate: f64, bin_count: usize, frames: Vec<SpectrumFrame>) -> Self {
        Self {
            sample_rate,
            bin_count,
            frames,
            fail_after: None,
            per_pump: None,
            unavailable: false,
            probe: DeviceProbe::default(),
        }
    }

    /// A device that refuses every acquisition, like a denied permission prompt
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(48000.0, 1024, Vec::new())
        }
    }

    /// Report the device lost after `frames` frames
    pub fn fail_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /// Deliver at most `frames` frames per pump, then report nothing ready
    pub fn paced(mut self, frames: usize) -> Self {
        self.per_pump = Some(frames);
        self
    }

    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }
}

impl CaptureDevice for ReplayDevice {
    type Stream = ReplayStream;

    fn acquire(&mut self) -> Result<ReplayStream, CaptureError> {
        if self.unavailable {
            return Err(CaptureError::Unavailable("permission denied".into()));
        }
        let claim = self.probe.0.lock.claim("replay device")?;
        self.probe.0.acquisitions.fetch_add(1, Ordering::SeqCst);

        Ok(ReplayStream {
            sample_rate: self.sample_rate,
            bin_count: self.bin_count,
            pending: self.frames.iter().cloned().collect(),
            delivered: 0,
            since_idle: 0,
            fail_after: self.fail_after,
            per_pump: self.per_pump,
            probe: self.probe.clone(),
            _claim: claim,
        })
    }
}

pub struct ReplayStream {
    sample_rate: f64,
    bin_count: usize,
    pending: VecDeque<SpectrumFrame>,
    delivered: usize,
    since_idle: usize,
    fail_after: Option<usize>,
    per_pump: Option<usize>,
    probe: DeviceProbe,
    _claim: DeviceClaim,
}

impl FrameStream for ReplayStream {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.bin_count
    }

    fn samples_per_frame(&self) -> usize {
        self.bin_count * 2
    }

    fn next_frame(&mut self) -> Result<Option<SpectrumFrame>, CaptureError> {
        if self.fail_after.is_some_and(|limit| self.delivered >= limit) {
            return Err(CaptureError::Interrupted("replay device lost".into()));
        }

        if self.per_pump.is_some_and(|limit| self.since_idle >= limit) {
            self.since_idle = 0;
            return Ok(None);
        }

        match self.pending.pop_front() {
            Some(frame) => {
                self.delivered += 1;
                self.since_idle += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.probe.0.releases.fetch_add(1, Ordering::SeqCst);
    }
}
