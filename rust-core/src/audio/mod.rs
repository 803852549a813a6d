//! Audio capture with cpal and the scan session built on it

pub mod input;
pub mod buffer;
pub mod session;
pub mod microphone;
pub mod replay;

pub use input::{list_input_devices, AudioDeviceInfo, AudioError, AudioInput};
pub use buffer::{SampleConsumer, SampleProducer, SampleRingBuffer};
pub use session::{
    CancelToken, CaptureDevice, CaptureError, DeviceClaim, DeviceLock, FrameStream, ScanSession,
    SessionState,
};
pub use microphone::{default_input_lock, Microphone, MicrophoneStream};
pub use replay::{DeviceProbe, ReplayDevice, ReplayStream};
