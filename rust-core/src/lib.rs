//! Resonance Scan - voice spectrum scan engine
//!
//! Captures a bounded stretch of microphone audio, averages its magnitude
//! spectrum, measures energy in a fixed table of frequency bands and reports the
//! dominant frequency, the weak bands and a few listening/breathing suggestions.
//!
//! The usual flow is [`audio::ScanSession`] driving a [`audio::Microphone`],
//! then [`sink::publish`] and [`sink::enrich_outcome`] on the finished
//! [`outcome::ScanOutcome`]. [`report::assemble`] can also be called directly on
//! an [`spectrum::AggregatedSpectrum`] built from recorded frames.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod bands;
pub mod config;
pub mod outcome;
pub mod report;
pub mod sink;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{CancelToken, CaptureDevice, CaptureError, Microphone, ScanSession, SessionState};
pub use bands::{BandDefinition, BandTable, BandTablePreset};
pub use config::{ConfigError, ScanConfig};
pub use outcome::{Notice, ScanOutcome};
pub use report::{assemble, AnalysisResult, ClassificationPolicy};
pub use spectrum::{AggregatedSpectrum, BandEnergyAggregator, SpectrumAnalyzer, SpectrumFrame};
