//! Per-band reading of normalized energies
//!
//! Maps each band's 0-100 energy to an activation state and attaches the
//! band's remedy text.

use super::table::BandDefinition;
use serde::Serialize;

/// Below this normalized energy a band reads as underactive
pub const UNDERACTIVE_BELOW: f64 = 35.0;

/// Above this normalized energy a band reads as overactive
pub const OVERACTIVE_ABOVE: f64 = 80.0;

const BALANCED_MESSAGE: &str = "This center is flowing in harmony.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BandState {
    Underactive,
    Balanced,
    Overactive,
}

impl BandState {
    pub fn from_energy(energy: f64) -> Self {
        if energy < UNDERACTIVE_BELOW {
            BandState::Underactive
        } else if energy > OVERACTIVE_ABOVE {
            BandState::Overactive
        } else {
            BandState::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remedy {
    pub tone: &'static str,
    pub breath: &'static str,
    pub practice: &'static str,
    pub affirmation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandInterpretation {
    pub band: &'static str,
    pub state: BandState,
    pub message: &'static str,
    pub remedy: Remedy,
}

/// Interpret one band at the given normalized energy
pub fn interpret_band(band: &BandDefinition, energy: f64) -> BandInterpretation {
    let state = BandState::from_energy(energy);
    let message = match state {
        BandState::Underactive => band.lore.under_message,
        BandState::Overactive => band.lore.over_message,
        BandState::Balanced => BALANCED_MESSAGE,
    };

    BandInterpretation {
        band: band.name,
        state,
        message,
        remedy: Remedy {
            tone: band.note,
            breath: band.lore.breath,
            practice: band.lore.practice,
            affirmation: band.lore.affirmation,
        },
    }
}
