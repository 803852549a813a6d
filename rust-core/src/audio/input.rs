//! Audio input capture using cpal
//!
//! Opens the microphone, downmixes to mono and feeds the sample ring buffer

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use super::buffer::SampleProducer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio input stream
///
/// Dropping it closes the stream and releases the device.
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
    lost: Arc<AtomicBool>,
}

impl AudioInput {
    /// Create audio input from default device
    ///
    /// # Arguments
    /// * `producer` - Ring buffer producer for captured mono samples
    pub fn from_default_device(producer: SampleProducer) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoDevice)?;

        Self::from_device(device, producer)
    }

    /// Create audio input from specific device
    pub fn from_device(device: Device, producer: SampleProducer) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let device_info = AudioDeviceInfo {
            name,
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };

        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();
        let lost = Arc::new(AtomicBool::new(false));

        // Wrap producer in Arc<Mutex> for thread-safe access
        let producer = Arc::new(Mutex::new(producer));

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, producer, &lost),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, producer, &lost),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, producer, &lost),
            other => return Err(AudioError::UnsupportedFormat(other.to_string())),
        }?;

        log::info!(
            "Opened input device '{}' ({} Hz, {} channel(s))",
            device_info.name,
            device_info.sample_rate,
            device_info.channels
        );

        Ok(Self {
            stream,
            device_info,
            lost,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }

    /// True once the driver has reported a stream error
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    producer: Arc<Mutex<SampleProducer>>,
    lost: &Arc<AtomicBool>,
) -> Result<Stream, AudioError>
where
    T: SizedSample,
    f64: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    let lost = Arc::clone(lost);
    let mut mono: Vec<f64> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                mono.clear();
                mono.extend(data.chunks(channels).map(|frame| {
                    frame.iter().map(|&s| f64::from_sample(s)).sum::<f64>() / frame.len() as f64
                }));

                if let Ok(mut prod) = producer.lock() {
                    prod.write(&mono);
                }
            },
            move |err| {
                log::warn!("Audio input error: {}", err);
                lost.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(AudioDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_devices() {
        // Just ensure it doesn't crash
        let _ = list_input_devices();
    }
}
