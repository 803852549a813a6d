//! Static band tables
//!
//! Seven named frequency bands, ordered low to high, each covering a half-open
//! `[min_hz, max_hz)` range. Tables are fixed configuration; two presets exist
//! and [`BandTablePreset::Voice`] is the canonical one.

use serde::{Deserialize, Serialize};

/// Descriptive text attached to a band, shared by every table preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandLore {
    pub under_message: &'static str,
    pub over_message: &'static str,
    pub practice: &'static str,
    pub affirmation: &'static str,
    pub breath: &'static str,
}

/// One named frequency band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandDefinition {
    /// Display name, also the key used in serialized results
    pub name: &'static str,

    /// Inclusive lower edge in Hz
    pub min_hz: f64,

    /// Exclusive upper edge in Hz
    pub max_hz: f64,

    /// Musical note associated with the band
    pub note: &'static str,

    /// Representative listening tone in Hz
    pub tone_hz: f64,

    pub meaning: &'static str,

    pub lore: &'static BandLore,
}

impl BandDefinition {
    /// Check whether `hz` falls inside `[min_hz, max_hz)`
    pub fn contains(&self, hz: f64) -> bool {
        hz >= self.min_hz && hz < self.max_hz
    }

    /// Listening tone inside this band
    ///
    /// The band's representative tone moved by whole octaves into
    /// `[min_hz, max_hz)`, keeping its note. When no octave lands inside, the
    /// band midpoint.
    pub fn listen_hz(&self) -> f64 {
        let mut hz = self.tone_hz;
        if hz > 0.0 {
            while hz >= self.max_hz {
                hz /= 2.0;
            }
            while hz < self.min_hz {
                hz *= 2.0;
            }
            if self.contains(hz) {
                return hz;
            }
        }
        (self.min_hz + self.max_hz) / 2.0
    }

    /// Inclusive bin-index range covered by this band
    ///
    /// `hz_per_bin = (sample_rate / 2) / bin_count`, the lower edge is floored and
    /// the upper edge ceiled, both clamped to `[0, bin_count - 1]`.
    ///
    /// A band starting at or above Nyquist is not clamped onto the last bin: it
    /// has no bins at all and its energy reads as 0.
    ///
    /// # Returns
    /// `None` when the range is empty: no bins, or the band starts at or above Nyquist
    pub fn bin_range(&self, sample_rate: f64, bin_count: usize) -> Option<(usize, usize)> {
        if bin_count == 0 || !(sample_rate > 0.0) {
            return None;
        }

        let nyquist = sample_rate / 2.0;
        if self.min_hz >= nyquist {
            return None;
        }

        let hz_per_bin = nyquist / bin_count as f64;
        let last = (bin_count - 1) as f64;
        let lo = (self.min_hz / hz_per_bin).floor().clamp(0.0, last) as usize;
        let hi = (self.max_hz / hz_per_bin).ceil().clamp(0.0, last) as usize;

        if lo > hi {
            None
        } else {
            Some((lo, hi))
        }
    }

    /// Frequency range formatted the way listening suggestions show it
    pub fn range_label(&self) -> String {
        format!("{}-{} Hz", self.min_hz, self.max_hz)
    }
}

/// Selectable band table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BandTablePreset {
    /// Octave-spaced bands over the voice harmonics, 63 Hz to 8 kHz
    #[default]
    Voice,

    /// Narrow windows around the speaking fundamental, 20 Hz to 1.4 kHz
    NoteWindows,
}

/// Ordered, immutable list of bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTable {
    bands: &'static [BandDefinition],
}

impl BandTable {
    /// Canonical table
    pub fn voice() -> Self {
        Self { bands: &VOICE_BANDS }
    }

    pub fn note_windows() -> Self {
        Self { bands: &NOTE_WINDOW_BANDS }
    }

    pub fn from_preset(preset: BandTablePreset) -> Self {
        match preset {
            BandTablePreset::Voice => Self::voice(),
            BandTablePreset::NoteWindows => Self::note_windows(),
        }
    }

    pub fn bands(&self) -> &'static [BandDefinition] {
        self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'static, BandDefinition> {
        self.bands.iter()
    }

    /// Band whose `[min_hz, max_hz)` contains `hz`
    pub fn band_for(&self, hz: f64) -> Option<&'static BandDefinition> {
        self.bands.iter().find(|band| band.contains(hz))
    }

    /// Look a band up by display name
    pub fn by_name(&self, name: &str) -> Option<&'static BandDefinition> {
        self.bands.iter().find(|band| band.name == name)
    }

    /// Mean magnitude of `magnitudes` over each band's bin range
    ///
    /// Bands with an empty range contribute 0.
    pub fn band_means(&self, magnitudes: &[f64], sample_rate: f64) -> Vec<f64> {
        self.bands
            .iter()
            .map(|band| match band.bin_range(sample_rate, magnitudes.len()) {
                Some((lo, hi)) => {
                    let slice = &magnitudes[lo..=hi];
                    slice.iter().sum::<f64>() / slice.len() as f64
                }
                None => 0.0,
            })
            .collect()
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::voice()
    }
}

static ROOT_LORE: BandLore = BandLore {
    under_message: "You may be feeling unsafe or disconnected from your body.",
    over_message: "You may be stuck in survival mode or hypervigilance.",
    practice: "Grounding breathwork with deep exhales.",
    affirmation: "I am safe in my body.",
    breath: "Box breathing",
};

static SACRAL_LORE: BandLore = BandLore {
    under_message: "You might be emotionally blocked or creatively numb.",
    over_message: "You may be over-identifying with pleasure or drama.",
    practice: "Hip movement & breath into pelvis.",
    affirmation: "I honor my feelings and flow.",
    breath: "Wave breath",
};

static SOLAR_LORE: BandLore = BandLore {
    under_message: "Low self-worth or indecision may be showing up.",
    over_message: "You might be controlling or overexerting force.",
    practice: "Fire breath + standing core activation.",
    affirmation: "I claim my power calmly.",
    breath: "Fire breath",
};

static HEART_LORE: BandLore = BandLore {
    under_message: "You may be emotionally withdrawn or walled off.",
    over_message: "You may give too much and lose yourself.",
    practice: "Heart-opening breath with open arms.",
    affirmation: "It's safe to feel.",
    breath: "Coherent breathing",
};

static THROAT_LORE: BandLore = BandLore {
    under_message: "You may be afraid to express your truth.",
    over_message: "You may be talking without deep alignment.",
    practice: "Humming & vocal toning.",
    affirmation: "My voice is clear and true.",
    breath: "Humming exhale",
};

static THIRD_EYE_LORE: BandLore = BandLore {
    under_message: "You may be disconnected from intuition.",
    over_message: "You may be overanalyzing or overly psychic.",
    practice: "Eyes-closed breath focus behind forehead.",
    affirmation: "I trust my inner vision.",
    breath: "Nadi Shodhana",
};

static CROWN_LORE: BandLore = BandLore {
    under_message: "You may feel disconnected from purpose.",
    over_message: "You may be spiritually ungrounded.",
    practice: "Stillness + listening.",
    affirmation: "I am connected to all.",
    breath: "Silent breath",
};

const fn band(
    name: &'static str,
    min_hz: f64,
    max_hz: f64,
    note: &'static str,
    tone_hz: f64,
    meaning: &'static str,
    lore: &'static BandLore,
) -> BandDefinition {
    BandDefinition { name, min_hz, max_hz, note, tone_hz, meaning, lore }
}

static VOICE_BANDS: [BandDefinition; 7] = [
    band("Root", 63.0, 250.0, "C", 256.0, "Grounding, survival, security", &ROOT_LORE),
    band("Sacral", 250.0, 500.0, "D", 288.0, "Creativity, sexuality, flow", &SACRAL_LORE),
    band("Solar Plexus", 500.0, 1000.0, "E", 320.0, "Confidence, identity, power", &SOLAR_LORE),
    band("Heart", 1000.0, 2000.0, "F", 341.3, "Love, compassion, connection", &HEART_LORE),
    band("Throat", 2000.0, 4000.0, "G", 384.0, "Truth, expression, authenticity", &THROAT_LORE),
    band("Third Eye", 4000.0, 6000.0, "A", 426.7, "Intuition, vision, inner knowing", &THIRD_EYE_LORE),
    band("Crown", 6000.0, 8000.0, "B", 480.0, "Oneness, divine connection, surrender", &CROWN_LORE),
];

static NOTE_WINDOW_BANDS: [BandDefinition; 7] = [
    band("Root", 20.0, 150.0, "C", 256.0, "Grounding, survival, security", &ROOT_LORE),
    band("Sacral", 150.0, 275.0, "D", 288.0, "Creativity, sexuality, flow", &SACRAL_LORE),
    band("Solar Plexus", 275.0, 400.0, "E", 320.0, "Confidence, identity, power", &SOLAR_LORE),
    band("Heart", 400.0, 600.0, "F", 341.3, "Love, compassion, connection", &HEART_LORE),
    band("Throat", 600.0, 850.0, "G", 384.0, "Truth, expression, authenticity", &THROAT_LORE),
    band("Third Eye", 850.0, 1100.0, "A", 426.7, "Intuition, vision, inner knowing", &THIRD_EYE_LORE),
    band("Crown", 1100.0, 1400.0, "B", 480.0, "Oneness, divine connection, surrender", &CROWN_LORE),
];
