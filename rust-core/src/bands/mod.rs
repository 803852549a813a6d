//! Frequency band tables and their interpretation

pub mod table;
pub mod interpret;

pub use table::{BandDefinition, BandLore, BandTable, BandTablePreset};
pub use interpret::{interpret_band, BandInterpretation, BandState};
