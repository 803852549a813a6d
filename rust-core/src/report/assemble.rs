//! Report assembly
//!
//! Turns a finished session's aggregate into the immutable [`AnalysisResult`]
//! shown to the user. Assembly is a pure function: it never touches devices or
//! storage and never fails, even for a session without frames.

use serde::{Deserialize, Serialize, Serializer};

use super::classify::{normalize_energies, ClassificationPolicy};
use super::core_frequency::extract_core_frequency;
use crate::bands::{interpret_band, BandDefinition, BandInterpretation, BandTable};
use crate::spectrum::AggregatedSpectrum;

/// Listening tone offered when neither a core frequency nor a missing band exists
pub const DEFAULT_LISTEN_HZ: f64 = 432.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergy {
    pub band: &'static BandDefinition,

    /// Normalized to 0-100 against the session maximum
    pub energy: f64,

    /// Aggregated mean magnitude before normalization
    pub raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    pub listen_hz: Vec<f64>,
    pub breathing_pattern: String,
    pub visualization: String,
}

/// Outcome of one completed scan
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    core_frequency_hz: Option<f64>,
    core_band: Option<&'static BandDefinition>,
    band_energies: Vec<BandEnergy>,
    missing_bands: Vec<&'static BandDefinition>,
    suggestions: Suggestions,
    policy: ClassificationPolicy,
    frame_count: u64,
}

impl AnalysisResult {
    pub fn core_frequency_hz(&self) -> Option<f64> {
        self.core_frequency_hz
    }

    pub fn core_band(&self) -> Option<&'static BandDefinition> {
        self.core_band
    }

    /// Core band name, or "Unknown" when the core frequency fell outside every band
    pub fn core_band_label(&self) -> &'static str {
        self.core_band.map(|band| band.name).unwrap_or("Unknown")
    }

    pub fn band_energies(&self) -> &[BandEnergy] {
        &self.band_energies
    }

    /// Flagged bands, in table order
    pub fn missing_bands(&self) -> &[&'static BandDefinition] {
        &self.missing_bands
    }

    pub fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    pub fn policy(&self) -> ClassificationPolicy {
        self.policy
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// One line per flagged band, worded for the classification mode
    pub fn missing_band_notes(&self) -> Vec<String> {
        let label = self.policy.missing_label();
        self.missing_bands
            .iter()
            .map(|band| format!("{} ({}): {}", band.name, band.range_label(), label))
            .collect()
    }

    /// Activation state and remedy for every band
    pub fn interpretations(&self) -> Vec<BandInterpretation> {
        self.band_energies
            .iter()
            .map(|entry| interpret_band(entry.band, entry.energy))
            .collect()
    }

    /// Wire form of the result
    pub fn to_record(&self) -> AnalysisRecord {
        AnalysisRecord {
            core_frequency_hz: self.core_frequency_hz,
            core_band: self.core_band.map(|band| band.name.to_string()),
            band_energies: self
                .band_energies
                .iter()
                .map(|entry| BandEnergyRecord {
                    band: entry.band.name.to_string(),
                    energy: entry.energy,
                })
                .collect(),
            missing_bands: self
                .missing_bands
                .iter()
                .map(|band| band.name.to_string())
                .collect(),
            suggestions: self.suggestions.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEnergyRecord {
    pub band: String,
    pub energy: f64,
}

/// JSON shape persisted and returned to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub core_frequency_hz: Option<f64>,
    pub core_band: Option<String>,
    pub band_energies: Vec<BandEnergyRecord>,
    pub missing_bands: Vec<String>,
    pub suggestions: Suggestions,
}

fn fixed_practices(policy: &ClassificationPolicy) -> (&'static str, &'static str) {
    match policy {
        ClassificationPolicy::AbsoluteThreshold { .. } => {
            ("5-5-5 technique", "Harmonic Glyph Visualization")
        }
        ClassificationPolicy::RelativeRank { .. } => {
            ("Coherent breathing, 5s in / 5s out", "Chakra Ring Visualization")
        }
    }
}

/// Build the report for a finished session
pub fn assemble(
    spectrum: &AggregatedSpectrum,
    table: &BandTable,
    policy: &ClassificationPolicy,
) -> AnalysisResult {
    let raw = table.band_means(spectrum.mean_magnitude_per_bin(), spectrum.sample_rate());
    let normalized = normalize_energies(&raw);

    let band_energies: Vec<BandEnergy> = table
        .iter()
        .zip(raw.iter().zip(normalized.iter()))
        .map(|(band, (&raw, &energy))| BandEnergy { band, energy, raw })
        .collect();

    let missing_bands: Vec<&'static BandDefinition> = policy
        .classify(&raw, spectrum.is_silent())
        .into_iter()
        .map(|i| &table.bands()[i])
        .collect();

    let core = extract_core_frequency(spectrum, table);

    let mut listen_hz = Vec::with_capacity(2);
    if let Some(core) = &core {
        listen_hz.push(core.hz);
    }
    if let Some(band) = missing_bands.first() {
        listen_hz.push(band.listen_hz());
    }
    if listen_hz.is_empty() {
        listen_hz.push(DEFAULT_LISTEN_HZ);
    }

    let (breathing, visualization) = fixed_practices(policy);

    AnalysisResult {
        core_frequency_hz: core.map(|c| c.hz),
        core_band: core.and_then(|c| c.band),
        band_energies,
        missing_bands,
        suggestions: Suggestions {
            listen_hz,
            breathing_pattern: breathing.to_string(),
            visualization: visualization.to_string(),
        },
        policy: *policy,
        frame_count: spectrum.frame_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::hz_per_bin;

    const ABSOLUTE: ClassificationPolicy = ClassificationPolicy::AbsoluteThreshold { epsilon: 1.0 };
    const RELATIVE: ClassificationPolicy = ClassificationPolicy::RelativeRank { k: 2 };

    /// Aggregate with a flat plateau inside each band
    ///
    /// Neighbouring band ranges share their edge bin, so only interior bins are
    /// filled and each band mean comes out slightly below its level.
    fn plateaus(levels: [f64; 7]) -> AggregatedSpectrum {
        // 16 kHz, 256 bins: 31.25 Hz per bin
        let table = BandTable::voice();
        let mut means = vec![0.0; 256];
        for (band, level) in table.iter().zip(levels) {
            let (lo, hi) = band.bin_range(16000.0, 256).unwrap();
            for m in &mut means[lo + 1..hi] {
                *m = level;
            }
        }
        AggregatedSpectrum::from_means(means, 10, 16000.0)
    }

    fn missing_names(result: &AnalysisResult) -> Vec<&'static str> {
        result.missing_bands().iter().map(|b| b.name).collect()
    }

    #[test]
    fn test_silent_session_result() {
        for policy in [ABSOLUTE, RELATIVE] {
            for spectrum in [
                AggregatedSpectrum::empty(44100.0, 512),
                AggregatedSpectrum::from_means(vec![0.0; 512], 20, 44100.0),
            ] {
                let result = assemble(&spectrum, &BandTable::voice(), &policy);
                assert_eq!(result.core_frequency_hz(), None);
                assert!(result.core_band().is_none());
                assert_eq!(result.missing_bands().len(), 7);
                assert!(!result.suggestions().breathing_pattern.is_empty());
                assert!(!result.suggestions().visualization.is_empty());
                assert!(!result.suggestions().listen_hz.is_empty());
                assert!(result.band_energies().iter().all(|e| e.energy == 0.0));
            }
        }
    }

    #[test]
    fn test_absolute_mode_flags_quiet_bands() {
        let spectrum = plateaus([50.0, 50.0, 0.0, 0.5, 50.0, 50.0, 50.0]);
        let result = assemble(&spectrum, &BandTable::voice(), &ABSOLUTE);
        assert_eq!(missing_names(&result), vec!["Solar Plexus", "Heart"]);
        assert_eq!(
            result.missing_band_notes()[0],
            "Solar Plexus (500-1000 Hz): no tone detected"
        );
    }

    #[test]
    fn test_relative_mode_missing_bands() {
        let spectrum = plateaus([10.0, 90.0, 5.0, 70.0, 60.0, 40.0, 20.0]);
        let result = assemble(&spectrum, &BandTable::voice(), &RELATIVE);
        assert_eq!(missing_names(&result), vec!["Root", "Solar Plexus"]);
        assert!(result.missing_band_notes()[1].ends_with("comparatively weak"));
    }

    #[test]
    fn test_normalized_energies_peak_at_100() {
        let spectrum = plateaus([10.0, 90.0, 5.0, 70.0, 60.0, 40.0, 20.0]);
        let result = assemble(&spectrum, &BandTable::voice(), &RELATIVE);
        let max = result
            .band_energies()
            .iter()
            .map(|e| e.energy)
            .fold(f64::MIN, f64::max);
        assert_eq!(max, 100.0);
        assert!(result.band_energies().iter().all(|e| e.energy >= 0.0));
    }

    #[test]
    fn test_suggestions_include_core_and_missing_tone() {
        let mut means = vec![0.0; 512];
        means[30] = 4.0;
        let spectrum = AggregatedSpectrum::from_means(means, 8, 44100.0);
        let result = assemble(&spectrum, &BandTable::voice(), &ABSOLUTE);

        let core_hz = 30.0 * hz_per_bin(44100.0, 512);
        assert_eq!(result.core_frequency_hz(), Some(core_hz));
        assert_eq!(result.core_band_label(), "Heart");

        let first_missing = result.missing_bands()[0];
        assert_eq!(result.suggestions().listen_hz, vec![core_hz, first_missing.listen_hz()]);
        assert!(first_missing.contains(result.suggestions().listen_hz[1]));
        assert_eq!(result.suggestions().breathing_pattern, "5-5-5 technique");
        assert_eq!(result.suggestions().visualization, "Harmonic Glyph Visualization");
    }

    #[test]
    fn test_missing_band_tone_lies_in_its_range() {
        for table in [BandTable::voice(), BandTable::note_windows()] {
            for (i, band) in table.iter().enumerate() {
                // Energy everywhere except this band; peak placed in another band
                let mut levels = [40.0; 7];
                levels[i] = 0.0;
                levels[(i + 3) % 7] = 90.0;

                let mut means = vec![0.0; 1024];
                for (other, level) in table.iter().zip(levels) {
                    // Stay two bins clear of the shared edge bins
                    let (lo, hi) = other.bin_range(44100.0, 1024).unwrap();
                    for m in &mut means[lo + 2..hi - 1] {
                        *m = level;
                    }
                }
                let spectrum = AggregatedSpectrum::from_means(means, 5, 44100.0);
                let result = assemble(&spectrum, &table, &ABSOLUTE);

                assert_eq!(result.missing_bands()[0].name, band.name);
                let listen = &result.suggestions().listen_hz;
                assert_eq!(listen.len(), 2);
                assert!(band.contains(listen[1]), "{} Hz outside {}", listen[1], band.name);
            }
        }
    }

    #[test]
    fn test_json_shape() {
        let mut means = vec![0.0; 512];
        means[1] = 2.0;
        let spectrum = AggregatedSpectrum::from_means(means, 3, 44100.0);
        let result = assemble(&spectrum, &BandTable::voice(), &RELATIVE);

        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert!(value["coreFrequencyHz"].is_number());
        // ~43 Hz lies below the canonical table
        assert!(value["coreBand"].is_null());
        assert_eq!(result.core_band_label(), "Unknown");
        assert_eq!(value["bandEnergies"].as_array().unwrap().len(), 7);
        assert_eq!(value["bandEnergies"][0]["band"], "Root");
        assert!(value["missingBands"].is_array());
        assert!(value["suggestions"]["listenHz"].is_array());
        assert!(value["suggestions"]["breathingPattern"].is_string());

        let record: AnalysisRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record, result.to_record());
    }

    #[test]
    fn test_interpretations_cover_every_band() {
        let spectrum = plateaus([10.0, 90.0, 5.0, 70.0, 60.0, 40.0, 20.0]);
        let result = assemble(&spectrum, &BandTable::voice(), &RELATIVE);
        let readings = result.interpretations();
        assert_eq!(readings.len(), 7);
        assert_eq!(readings[1].band, "Sacral");
    }
}
