//! Spectrum frames and the session-wide aggregate

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Frame has {found} bins, session expects {expected}")]
    BinCountMismatch { expected: usize, found: usize },

    #[error("Frame sample rate {found} Hz does not match session rate {expected} Hz")]
    SampleRateMismatch { expected: f64, found: f64 },

    #[error("FFT processing failed: {0}")]
    Fft(String),
}

/// Width of one bin in Hz for a spectrum of `bin_count` bins up to Nyquist
pub fn hz_per_bin(sample_rate: f64, bin_count: usize) -> f64 {
    if bin_count == 0 {
        0.0
    } else {
        (sample_rate / 2.0) / bin_count as f64
    }
}

/// One magnitude spectrum, bins `0..N-1` spanning DC up to Nyquist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumFrame {
    magnitudes: Vec<f64>,
    sample_rate: f64,
}

impl SpectrumFrame {
    /// Negative and non-finite magnitudes are stored as 0
    pub fn new(mut magnitudes: Vec<f64>, sample_rate: f64) -> Self {
        for m in magnitudes.iter_mut() {
            if !m.is_finite() || *m < 0.0 {
                *m = 0.0;
            }
        }

        Self {
            magnitudes,
            sample_rate,
        }
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn hz_per_bin(&self) -> f64 {
        hz_per_bin(self.sample_rate, self.magnitudes.len())
    }
}

/// Per-bin running mean magnitude over every frame of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSpectrum {
    mean_magnitude_per_bin: Vec<f64>,
    frame_count: u64,
    sample_rate: f64,
    bin_count: usize,
}

impl AggregatedSpectrum {
    /// Aggregate of zero frames
    pub fn empty(sample_rate: f64, bin_count: usize) -> Self {
        Self {
            mean_magnitude_per_bin: vec![0.0; bin_count],
            frame_count: 0,
            sample_rate,
            bin_count,
        }
    }

    /// Build an aggregate from already-averaged magnitudes
    pub fn from_means(means: Vec<f64>, frame_count: u64, sample_rate: f64) -> Self {
        let bin_count = means.len();
        let frame = SpectrumFrame::new(means, sample_rate);
        Self {
            mean_magnitude_per_bin: frame.magnitudes,
            frame_count,
            sample_rate,
            bin_count,
        }
    }

    pub fn mean_magnitude_per_bin(&self) -> &[f64] {
        &self.mean_magnitude_per_bin
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn hz_per_bin(&self) -> f64 {
        hz_per_bin(self.sample_rate, self.bin_count)
    }

    /// True when no frame carried any energy
    pub fn is_silent(&self) -> bool {
        self.frame_count == 0 || self.mean_magnitude_per_bin.iter().all(|&m| m == 0.0)
    }

    /// Fold one frame into the running per-bin mean
    pub(crate) fn fold(&mut self, frame: &SpectrumFrame) {
        self.frame_count += 1;
        let n = self.frame_count as f64;
        for (mean, &x) in self.mean_magnitude_per_bin.iter_mut().zip(frame.magnitudes()) {
            *mean += (x - *mean) / n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clamps_invalid_magnitudes() {
        let frame = SpectrumFrame::new(vec![1.0, -2.0, f64::NAN, f64::INFINITY], 48000.0);
        assert_eq!(frame.magnitudes(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hz_per_bin() {
        assert!((hz_per_bin(44100.0, 512) - 43.06640625).abs() < 1e-12);
        assert_eq!(hz_per_bin(44100.0, 0), 0.0);
    }

    #[test]
    fn test_fold_is_running_mean() {
        let mut agg = AggregatedSpectrum::empty(1000.0, 2);
        agg.fold(&SpectrumFrame::new(vec![1.0, 4.0], 1000.0));
        agg.fold(&SpectrumFrame::new(vec![3.0, 0.0], 1000.0));
        agg.fold(&SpectrumFrame::new(vec![5.0, 2.0], 1000.0));

        assert_eq!(agg.frame_count(), 3);
        assert!((agg.mean_magnitude_per_bin()[0] - 3.0).abs() < 1e-12);
        assert!((agg.mean_magnitude_per_bin()[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_silence() {
        assert!(AggregatedSpectrum::empty(1000.0, 8).is_silent());
        assert!(AggregatedSpectrum::from_means(vec![0.0; 8], 5, 1000.0).is_silent());
        assert!(!AggregatedSpectrum::from_means(vec![0.0, 1.0], 1, 1000.0).is_silent());
    }
}
