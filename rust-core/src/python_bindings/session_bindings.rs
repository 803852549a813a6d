//! Python bindings for microphone scan sessions

use pyo3::prelude::*;
use crate::audio::{list_input_devices, Microphone, ScanSession, SessionState};
use crate::config::ScanConfig;

fn state_name(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Capturing => "capturing",
        SessionState::Completed => "completed",
        SessionState::Errored => "errored",
    }
}

/// Audio device information exposed to Python
#[pyclass(name = "AudioDeviceInfo")]
#[derive(Clone)]
pub struct PyAudioDeviceInfo {
    #[pyo3(get)]
    pub name: String,
    #[pyo3(get)]
    pub sample_rate: u32,
    #[pyo3(get)]
    pub channels: u16,
}

/// Microphone scan session exposed to Python
///
/// The host calls `pump()` periodically (e.g. from a UI timer) until the state
/// leaves "capturing".
#[pyclass(name = "ScanSession", unsendable)]
pub struct PyScanSession {
    session: ScanSession<Microphone>,
}

#[pymethods]
impl PyScanSession {
    /// Create a new scan session
    ///
    /// Args:
    ///     config_json: Optional ScanConfig document; defaults apply to missing fields
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => ScanConfig::from_json_str(json)
                .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?,
            None => ScanConfig::default(),
        };

        Ok(Self {
            session: ScanSession::new(Microphone::new(&config), &config),
        })
    }

    /// Acquire the microphone and start capturing
    fn start(&mut self) -> PyResult<()> {
        self.session
            .start()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }

    /// Process all buffered audio
    ///
    /// Returns:
    ///     Session state after pumping
    fn pump(&mut self) -> &'static str {
        state_name(self.session.pump())
    }

    /// Stop early and build the report from what was captured
    fn stop(&mut self) -> &'static str {
        state_name(self.session.stop())
    }

    /// Request cancellation; takes effect on the next pump
    fn cancel(&self) {
        self.session.cancel_token().cancel();
    }

    #[getter]
    fn state(&self) -> &'static str {
        state_name(self.session.state())
    }

    #[getter]
    fn frame_count(&self) -> u64 {
        self.session.frame_count()
    }

    /// Running per-band energies of the current capture
    fn band_energies(&self) -> Option<Vec<f64>> {
        self.session.band_energies().map(|energies| energies.to_vec())
    }

    /// Failure message when the session errored
    fn error(&self) -> Option<String> {
        self.session.error().map(|e| e.to_string())
    }

    /// Analysis result as JSON, once completed
    fn result_json(&self) -> PyResult<Option<String>> {
        self.session
            .result()
            .map(|result| result.to_json())
            .transpose()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }

    /// Result plus notices as JSON, once completed
    fn outcome_json(&self) -> PyResult<Option<String>> {
        self.session
            .outcome()
            .map(|outcome| serde_json::to_string(&outcome))
            .transpose()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
    }

    /// List available input devices
    #[staticmethod]
    fn list_input_devices() -> PyResult<Vec<PyAudioDeviceInfo>> {
        let devices = list_input_devices()
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|d| PyAudioDeviceInfo {
                name: d.name,
                sample_rate: d.sample_rate,
                channels: d.channels,
            })
            .collect())
    }
}
