//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod session_bindings;
mod report_bindings;

/// Python module definition
#[pymodule]
fn resonance_scan(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<session_bindings::PyScanSession>()?;
    m.add_class::<session_bindings::PyAudioDeviceInfo>()?;
    m.add_class::<report_bindings::PySpectrumAggregator>()?;

    m.add_function(wrap_pyfunction!(report_bindings::analyze_spectrum, m)?)?;
    m.add_function(wrap_pyfunction!(report_bindings::band_table, m)?)?;

    Ok(())
}
