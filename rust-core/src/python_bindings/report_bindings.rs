//! Python bindings for aggregation and report assembly

use pyo3::prelude::*;
use numpy::{PyArray1, PyReadonlyArray1};
use crate::bands::{BandTable, BandTablePreset};
use crate::report::{assemble, ClassificationPolicy};
use crate::spectrum::{AggregatedSpectrum, BandEnergyAggregator, SpectrumFrame};

fn value_error(msg: impl ToString) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(msg.to_string())
}

fn parse_preset(name: &str) -> PyResult<BandTablePreset> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| value_error(format!("unknown band table '{}'", name)))
}

fn parse_policy(json: Option<&str>) -> PyResult<ClassificationPolicy> {
    match json {
        Some(json) => serde_json::from_str(json).map_err(value_error),
        None => Ok(ClassificationPolicy::default()),
    }
}

fn report_json(
    spectrum: &AggregatedSpectrum,
    table: &BandTable,
    policy_json: Option<&str>,
) -> PyResult<String> {
    let policy = parse_policy(policy_json)?;
    assemble(spectrum, table, &policy)
        .to_json()
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(e.to_string()))
}

/// Band energy aggregator exposed to Python
///
/// Feeds magnitude frames computed elsewhere (e.g. a recorded scan).
#[pyclass(name = "SpectrumAggregator")]
pub struct PySpectrumAggregator {
    aggregator: BandEnergyAggregator,
}

#[pymethods]
impl PySpectrumAggregator {
    /// Create a new aggregator
    ///
    /// Args:
    ///     sample_rate: Sample rate in Hz
    ///     bin_count: Bins per frame
    ///     band_table: "voice" or "noteWindows"
    #[new]
    #[pyo3(signature = (sample_rate, bin_count, band_table="voice"))]
    fn new(sample_rate: f64, bin_count: usize, band_table: &str) -> PyResult<Self> {
        let table = BandTable::from_preset(parse_preset(band_table)?);
        Ok(Self {
            aggregator: BandEnergyAggregator::new(table, sample_rate, bin_count),
        })
    }

    /// Fold one magnitude frame into the running means
    fn push(&mut self, magnitudes: PyReadonlyArray1<f64>) -> PyResult<()> {
        let mags = magnitudes.as_slice().map_err(value_error)?;
        let frame = SpectrumFrame::new(mags.to_vec(), self.aggregator.spectrum().sample_rate());
        self.aggregator.push(&frame).map_err(value_error)
    }

    #[getter]
    fn frame_count(&self) -> u64 {
        self.aggregator.frame_count()
    }

    /// Mean magnitude per bin
    fn mean_spectrum<'py>(&self, py: Python<'py>) -> &'py PyArray1<f64> {
        PyArray1::from_slice(py, self.aggregator.spectrum().mean_magnitude_per_bin())
    }

    /// Running mean energy per band, in table order
    fn band_energies(&self) -> Vec<f64> {
        self.aggregator.band_energies().to_vec()
    }

    /// Build the analysis report
    ///
    /// Args:
    ///     policy_json: Optional classification policy, e.g. '{"mode": "relativeRank", "k": 2}'
    ///
    /// Returns:
    ///     AnalysisResult as JSON
    #[pyo3(signature = (policy_json=None))]
    fn assemble(&self, policy_json: Option<&str>) -> PyResult<String> {
        report_json(self.aggregator.spectrum(), &self.aggregator.table(), policy_json)
    }
}

/// Build a report from an already averaged spectrum
#[pyfunction]
#[pyo3(signature = (mean_magnitudes, sample_rate, frame_count=1, policy_json=None, band_table="voice"))]
pub fn analyze_spectrum(
    mean_magnitudes: PyReadonlyArray1<f64>,
    sample_rate: f64,
    frame_count: u64,
    policy_json: Option<&str>,
    band_table: &str,
) -> PyResult<String> {
    let means = mean_magnitudes.as_slice().map_err(value_error)?.to_vec();
    let spectrum = AggregatedSpectrum::from_means(means, frame_count, sample_rate);
    let table = BandTable::from_preset(parse_preset(band_table)?);
    report_json(&spectrum, &table, policy_json)
}

/// Band definitions as (name, min_hz, max_hz, note, tone_hz) tuples
#[pyfunction]
#[pyo3(signature = (preset="voice"))]
pub fn band_table(preset: &str) -> PyResult<Vec<(String, f64, f64, String, f64)>> {
    let table = BandTable::from_preset(parse_preset(preset)?);
    Ok(table
        .iter()
        .map(|band| {
            (
                band.name.to_string(),
                band.min_hz,
                band.max_hz,
                band.note.to_string(),
                band.tone_hz,
            )
        })
        .collect())
}
