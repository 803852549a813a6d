//! Completed-session analysis: core frequency, weak bands, final report

pub mod core_frequency;
pub mod classify;
pub mod assemble;

pub use core_frequency::{extract_core_frequency, CoreFrequency};
pub use classify::{normalize_energies, ClassificationPolicy};
pub use assemble::{assemble, AnalysisRecord, AnalysisResult, BandEnergy, Suggestions};
