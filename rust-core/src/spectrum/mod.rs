//! Spectral analysis and session aggregation

pub mod fft;
pub mod windowing;
pub mod analysis;
pub mod frame;
pub mod aggregator;

pub use fft::FftEngine;
pub use windowing::WindowType;
pub use analysis::{AnalyzerConfig, SpectrumAnalyzer};
pub use frame::{hz_per_bin, AggregatedSpectrum, SpectrumError, SpectrumFrame};
pub use aggregator::BandEnergyAggregator;
