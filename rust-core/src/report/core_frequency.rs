//! Core frequency extraction

use crate::bands::{BandDefinition, BandTable};
use crate::spectrum::AggregatedSpectrum;

/// Dominant frequency of a finished session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoreFrequency {
    pub peak_bin: usize,
    pub hz: f64,

    /// `None` when no band contains `hz`
    pub band: Option<&'static BandDefinition>,
}

/// Index of the largest magnitude, ties resolved to the lowest index
///
/// Returns `None` for an empty or all-zero spectrum.
pub fn peak_bin(magnitudes: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &m) in magnitudes.iter().enumerate() {
        let better = match best {
            Some((_, top)) => m > top,
            None => m > 0.0,
        };
        if better {
            best = Some((i, m));
        }
    }
    best.map(|(i, _)| i)
}

/// Find the session's core frequency and resolve it against `table`
pub fn extract_core_frequency(
    spectrum: &AggregatedSpectrum,
    table: &BandTable,
) -> Option<CoreFrequency> {
    if spectrum.frame_count() == 0 {
        return None;
    }

    let peak = peak_bin(spectrum.mean_magnitude_per_bin())?;
    let hz = peak as f64 * spectrum.hz_per_bin();

    Some(CoreFrequency {
        peak_bin: peak,
        hz,
        band: table.band_for(hz),
    })
}
