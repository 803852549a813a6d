//! FFT engine using realfft for real-valued signals
//!
//! Produces amplitude-scaled magnitude spectra for capture blocks

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use super::SpectrumError;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute the amplitude spectrum of `signal`
    ///
    /// `signal` is zero-padded or truncated to the FFT size. Magnitudes are
    /// scaled by `2 / fft_size` so a full-scale sine reads close to its
    /// amplitude. Only the first `out.len()` bins are written.
    pub fn compute_magnitude_into(
        &mut self,
        signal: &[f64],
        out: &mut [f64],
    ) -> Result<(), SpectrumError> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)
            .map_err(|e| SpectrumError::Fft(e.to_string()))?;

        let scale = 2.0 / self.fft_size as f64;
        for (o, c) in out.iter_mut().zip(self.output_buffer.iter()) {
            *o = c.norm() * scale;
        }

        Ok(())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}
