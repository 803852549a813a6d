//! High-level spectrum analyzer
//!
//! Combines FFT engine with windowing to turn capture blocks into
//! [`SpectrumFrame`]s of a fixed bin count.

use super::fft::FftEngine;
use super::frame::{SpectrumError, SpectrumFrame};
use super::windowing::{apply_window_inplace, generate_window, window_correction_factor, WindowType};

/// Spectrum analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Bins per frame; the FFT runs over `2 * bin_count` samples
    pub bin_count: usize,

    /// Window type for spectral analysis
    pub window_type: WindowType,

    /// Sample rate in Hz
    pub sample_rate: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bin_count: 1024,
            window_type: WindowType::Hann,
            sample_rate: 48000.0,
        }
    }
}

/// Block-to-frame spectrum analyzer
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    fft_engine: FftEngine,
    window: Vec<f64>,
    correction_factor: f64,
    scratch: Vec<f64>,
}

impl SpectrumAnalyzer {
    /// Create new spectrum analyzer
    pub fn new(config: AnalyzerConfig) -> Self {
        let fft_size = config.bin_count * 2;
        let fft_engine = FftEngine::new(fft_size);
        let window = generate_window(config.window_type, fft_size);
        let correction_factor = window_correction_factor(&window);

        Self {
            config,
            fft_engine,
            window,
            correction_factor,
            scratch: vec![0.0; fft_size],
        }
    }

    /// Samples consumed per frame
    pub fn block_size(&self) -> usize {
        self.fft_engine.fft_size()
    }

    /// Analyze one block of mono samples
    ///
    /// Shorter blocks are zero-padded, longer ones truncated. The Nyquist bin is
    /// dropped so the frame holds exactly `bin_count` bins.
    pub fn analyze(&mut self, block: &[f64]) -> Result<SpectrumFrame, SpectrumError> {
        let copy_len = block.len().min(self.scratch.len());
        self.scratch[..copy_len].copy_from_slice(&block[..copy_len]);
        self.scratch[copy_len..].fill(0.0);
        apply_window_inplace(&mut self.scratch, &self.window);

        let mut magnitudes = vec![0.0; self.config.bin_count];
        self.fft_engine
            .compute_magnitude_into(&self.scratch, &mut magnitudes)?;

        for m in magnitudes.iter_mut() {
            *m *= self.correction_factor;
        }

        Ok(SpectrumFrame::new(magnitudes, self.config.sample_rate))
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_analyzer_peak_lands_on_tone() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig {
            bin_count: 512,
            window_type: WindowType::Hann,
            sample_rate: 48000.0,
        });
        assert_eq!(analyzer.block_size(), 1024);

        // 1 kHz at 48 kHz, hz_per_bin = 46.875
        let signal: Vec<f64> = (0..1024)
            .map(|n| 0.5 * (2.0 * PI * 1000.0 * n as f64 / 48000.0).sin())
            .collect();

        let frame = analyzer.analyze(&signal).unwrap();
        assert_eq!(frame.bin_count(), 512);

        let (peak_idx, &peak) = frame
            .magnitudes()
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();

        let peak_hz = peak_idx as f64 * frame.hz_per_bin();
        assert!((peak_hz - 1000.0).abs() < 50.0);

        // Amplitude correction keeps the peak in the neighbourhood of 0.5
        assert!(peak > 0.3 && peak < 0.6);
    }

    #[test]
    fn test_silence_gives_zero_frame() {
        let mut analyzer = SpectrumAnalyzer::new(AnalyzerConfig::default());
        let frame = analyzer.analyze(&[0.0; 2048]).unwrap();
        assert_eq!(frame.bin_count(), 1024);
        assert!(frame.magnitudes().iter().all(|&m| m == 0.0));
    }
}
