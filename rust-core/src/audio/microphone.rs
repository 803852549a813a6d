//! Microphone-backed capture device
//!
//! The driver callback only writes mono samples into the ring buffer. Blocks are
//! cut and analyzed on the caller's thread whenever the session pumps.

use std::sync::OnceLock;

use super::buffer::{SampleConsumer, SampleRingBuffer};
use super::input::AudioInput;
use super::session::{CaptureDevice, CaptureError, DeviceClaim, DeviceLock, FrameStream};
use crate::config::ScanConfig;
use crate::spectrum::{AnalyzerConfig, SpectrumAnalyzer, SpectrumFrame, WindowType};

/// Claim on the default input, shared by every session in the process
pub fn default_input_lock() -> &'static DeviceLock {
    static LOCK: OnceLock<DeviceLock> = OnceLock::new();
    LOCK.get_or_init(DeviceLock::new)
}

/// Default system input device
///
/// Only one stream may hold it at a time; a second acquire while a scan is
/// capturing fails with "microphone in use".
#[derive(Debug, Clone)]
pub struct Microphone {
    bin_count: usize,
    window_type: WindowType,
    ring_capacity: usize,
}

impl Microphone {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            bin_count: config.bin_count,
            window_type: config.window_type,
            ring_capacity: config.ring_buffer_capacity.max(config.bin_count * 2),
        }
    }
}

impl CaptureDevice for Microphone {
    type Stream = MicrophoneStream;

    fn acquire(&mut self) -> Result<MicrophoneStream, CaptureError> {
        let claim = default_input_lock().claim("microphone")?;
        let (producer, consumer) = SampleRingBuffer::new(self.ring_capacity).split();
        let input = AudioInput::from_default_device(producer)?;
        input.start()?;

        let sample_rate = input.device_info().sample_rate as f64;
        let analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            bin_count: self.bin_count,
            window_type: self.window_type,
            sample_rate,
        });
        let block = vec![0.0; analyzer.block_size()];

        Ok(MicrophoneStream {
            input,
            consumer,
            analyzer,
            block,
            sample_rate,
            _claim: claim,
        })
    }
}

/// Open microphone capture
///
/// Dropping it stops the driver stream and frees the device.
pub struct MicrophoneStream {
    input: AudioInput,
    consumer: SampleConsumer,
    analyzer: SpectrumAnalyzer,
    block: Vec<f64>,
    sample_rate: f64,

    // Dropped after the stream is paused
    _claim: DeviceClaim,
}

impl MicrophoneStream {
    pub fn device_name(&self) -> &str {
        &self.input.device_info().name
    }

    /// Samples lost to ring buffer overflow
    pub fn dropped_samples(&self) -> u64 {
        self.consumer.dropped()
    }
}

impl FrameStream for MicrophoneStream {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn bin_count(&self) -> usize {
        self.analyzer.config().bin_count
    }

    fn samples_per_frame(&self) -> usize {
        self.analyzer.block_size()
    }

    fn next_frame(&mut self) -> Result<Option<SpectrumFrame>, CaptureError> {
        // Buffered audio is still analyzed after the device is lost
        if self.consumer.pop_block(&mut self.block) {
            return self
                .analyzer
                .analyze(&self.block)
                .map(Some)
                .map_err(|e| CaptureError::Interrupted(e.to_string()));
        }

        if self.input.is_lost() {
            return Err(CaptureError::Interrupted(format!(
                "input device '{}' stopped delivering audio",
                self.device_name()
            )));
        }

        Ok(None)
    }
}

impl Drop for MicrophoneStream {
    fn drop(&mut self) {
        if let Err(e) = self.input.pause() {
            log::debug!("Pausing input stream on release failed: {}", e);
        }
        log::info!(
            "Released input device '{}' ({} samples dropped)",
            self.device_name(),
            self.dropped_samples()
        );
    }
}
