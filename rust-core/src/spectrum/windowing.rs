//! Windowing functions for spectral analysis
//!
//! Tapers each capture block before the FFT to reduce spectral leakage
//! between neighbouring bands.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(M-1))
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(M-1))
    Hamming,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (M)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..M-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f64> {
    if length < 2 {
        return vec![1.0; length];
    }

    let m = length as f64;
    let (a0, a1) = match window_type {
        WindowType::Hann => (0.5, 0.5),
        WindowType::Hamming => (0.54, 0.46),
        WindowType::Rectangular => return vec![1.0; length],
    };

    (0..length)
        .map(|n| {
            let angle = 2.0 * PI * n as f64 / (m - 1.0);
            a0 - a1 * angle.cos()
        })
        .collect()
}

/// Multiply `signal` by precomputed `window` coefficients in place
///
/// Samples past the end of `window` are left untouched.
pub fn apply_window_inplace(signal: &mut [f64], window: &[f64]) {
    for (s, w) in signal.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}

/// Calculate window correction factor
///
/// When applying windows, the signal amplitude is reduced. This factor
/// can be used to correct the FFT magnitude.
///
/// # Returns
/// Correction factor (multiply FFT magnitude by this)
pub fn window_correction_factor(window: &[f64]) -> f64 {
    let sum: f64 = window.iter().sum();
    if sum > 0.0 {
        window.len() as f64 / sum
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_window() {
        let window = generate_window(WindowType::Hamming, 100);
        let mut signal = vec![1.0; 100];
        apply_window_inplace(&mut signal, &window);

        // Center should be close to 1.0
        assert!((signal[50] - 1.0).abs() < 0.01);

        // Edges should be reduced (Hamming ~0.08)
        assert!(signal[0] < 0.1);
        assert!(signal[99] < 0.1);
    }

    #[test]
    fn test_hann_endpoints_and_symmetry() {
        let hann = generate_window(WindowType::Hann, 161);
        assert!(hann[0].abs() < 1e-12);
        assert!((hann[0] - hann[160]).abs() < 1e-12);
        assert!((hann[80] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correction_factor() {
        let factor_rect = window_correction_factor(&generate_window(WindowType::Rectangular, 100));
        let factor_hann = window_correction_factor(&generate_window(WindowType::Hann, 100));

        // Rectangular window has no correction needed
        assert!((factor_rect - 1.0).abs() < 0.01);

        // Hann halves the coherent gain
        assert!(factor_hann > 1.9 && factor_hann < 2.1);
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(generate_window(WindowType::Hann, 0).is_empty());
        assert_eq!(generate_window(WindowType::Hann, 1), vec![1.0]);
        assert_eq!(window_correction_factor(&[]), 1.0);
    }
}
