//! Band energy aggregation
//!
//! Folds each spectrum frame into two running means: one per bin (the
//! [`AggregatedSpectrum`]) and one per band of the table. Memory stays O(bins)
//! regardless of session length.

use super::frame::{AggregatedSpectrum, SpectrumError, SpectrumFrame};
use crate::bands::BandTable;

/// Running aggregate for one capture session
#[derive(Debug, Clone)]
pub struct BandEnergyAggregator {
    table: BandTable,
    spectrum: AggregatedSpectrum,

    /// Bin range per band, precomputed for the session's frame shape
    band_ranges: Vec<Option<(usize, usize)>>,

    /// Running mean of each band's per-frame average
    band_means: Vec<f64>,
}

impl BandEnergyAggregator {
    pub fn new(table: BandTable, sample_rate: f64, bin_count: usize) -> Self {
        let band_ranges = table
            .iter()
            .map(|band| band.bin_range(sample_rate, bin_count))
            .collect();

        Self {
            table,
            spectrum: AggregatedSpectrum::empty(sample_rate, bin_count),
            band_ranges,
            band_means: vec![0.0; table.len()],
        }
    }

    /// Fold one frame into the aggregate
    ///
    /// Frames whose shape differs from the session's are rejected and leave
    /// the aggregate untouched.
    pub fn push(&mut self, frame: &SpectrumFrame) -> Result<(), SpectrumError> {
        if frame.bin_count() != self.spectrum.bin_count() {
            return Err(SpectrumError::BinCountMismatch {
                expected: self.spectrum.bin_count(),
                found: frame.bin_count(),
            });
        }
        if frame.sample_rate() != self.spectrum.sample_rate() {
            return Err(SpectrumError::SampleRateMismatch {
                expected: self.spectrum.sample_rate(),
                found: frame.sample_rate(),
            });
        }

        self.spectrum.fold(frame);

        let n = self.spectrum.frame_count() as f64;
        let magnitudes = frame.magnitudes();
        for (mean, range) in self.band_means.iter_mut().zip(self.band_ranges.iter()) {
            let frame_avg = match *range {
                Some((lo, hi)) => {
                    let slice = &magnitudes[lo..=hi];
                    slice.iter().sum::<f64>() / slice.len() as f64
                }
                None => 0.0,
            };
            *mean += (frame_avg - *mean) / n;
        }

        Ok(())
    }

    /// Rebuild an aggregate from stored frames, in order
    pub fn replay<'a, I>(
        table: BandTable,
        sample_rate: f64,
        bin_count: usize,
        frames: I,
    ) -> Result<Self, SpectrumError>
    where
        I: IntoIterator<Item = &'a SpectrumFrame>,
    {
        let mut aggregator = Self::new(table, sample_rate, bin_count);
        for frame in frames {
            aggregator.push(frame)?;
        }
        Ok(aggregator)
    }

    pub fn spectrum(&self) -> &AggregatedSpectrum {
        &self.spectrum
    }

    /// Running per-band mean magnitudes, in table order
    pub fn band_energies(&self) -> &[f64] {
        &self.band_means
    }

    pub fn table(&self) -> BandTable {
        self.table
    }

    pub fn frame_count(&self) -> u64 {
        self.spectrum.frame_count()
    }

    pub fn into_spectrum(self) -> AggregatedSpectrum {
        self.spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frames(count: usize, bins: usize, sample_rate: f64) -> Vec<SpectrumFrame> {
        (0..count)
            .map(|i| {
                let mags = (0..bins)
                    .map(|b| ((i * 31 + b * 7) % 13) as f64 * 0.37 + (b as f64).sin().abs())
                    .collect();
                SpectrumFrame::new(mags, sample_rate)
            })
            .collect()
    }

    #[test]
    fn test_replay_is_bit_identical() {
        let table = BandTable::voice();
        let stored = frames(40, 512, 44100.0);

        let first = BandEnergyAggregator::replay(table, 44100.0, 512, &stored).unwrap();
        let second = BandEnergyAggregator::replay(table, 44100.0, 512, &stored).unwrap();

        assert_eq!(first.spectrum(), second.spectrum());
        assert_eq!(first.band_energies(), second.band_energies());
        assert_eq!(first.frame_count(), 40);
    }

    #[test]
    fn test_band_means_match_per_bin_aggregate() {
        let table = BandTable::voice();
        let stored = frames(25, 1024, 48000.0);
        let agg = BandEnergyAggregator::replay(table, 48000.0, 1024, &stored).unwrap();

        let derived = table.band_means(agg.spectrum().mean_magnitude_per_bin(), 48000.0);
        for (running, post_hoc) in agg.band_energies().iter().zip(derived.iter()) {
            assert_relative_eq!(*running, *post_hoc, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_band_average_over_range() {
        // 44100 Hz, 512 bins: Root covers bins 1..=6
        let mut agg = BandEnergyAggregator::new(BandTable::voice(), 44100.0, 512);
        let mut mags = vec![0.0; 512];
        for m in &mut mags[1..=6] {
            *m = 3.0;
        }
        agg.push(&SpectrumFrame::new(mags, 44100.0)).unwrap();
        agg.push(&SpectrumFrame::new(vec![0.0; 512], 44100.0)).unwrap();

        assert_relative_eq!(agg.band_energies()[0], 1.5);
        assert_eq!(agg.spectrum().mean_magnitude_per_bin()[3], 1.5);
    }

    #[test]
    fn test_rejects_mismatched_frames() {
        let mut agg = BandEnergyAggregator::new(BandTable::voice(), 44100.0, 512);

        let err = agg.push(&SpectrumFrame::new(vec![1.0; 256], 44100.0)).unwrap_err();
        assert_eq!(err, SpectrumError::BinCountMismatch { expected: 512, found: 256 });

        let err = agg.push(&SpectrumFrame::new(vec![1.0; 512], 48000.0)).unwrap_err();
        assert!(matches!(err, SpectrumError::SampleRateMismatch { .. }));

        assert_eq!(agg.frame_count(), 0);
    }

    #[test]
    fn test_band_above_nyquist_contributes_zero() {
        // 8 kHz capture: Third Eye and Crown start at or above Nyquist
        let mut agg = BandEnergyAggregator::new(BandTable::voice(), 8000.0, 256);
        agg.push(&SpectrumFrame::new(vec![1.0; 256], 8000.0)).unwrap();

        let energies = agg.band_energies();
        assert_relative_eq!(energies[4], 1.0);
        assert_eq!(energies[5], 0.0);
        assert_eq!(energies[6], 0.0);
    }
}
