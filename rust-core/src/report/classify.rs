//! Weak and missing band classification

use serde::{Deserialize, Serialize};

/// Default number of bands flagged in relative-rank mode
pub const DEFAULT_RANK_K: usize = 2;

/// Default near-silence threshold for absolute mode, in amplitude units
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// How bands get flagged as missing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ClassificationPolicy {
    /// A band is missing when its energy is at or below `epsilon`
    AbsoluteThreshold { epsilon: f64 },

    /// The `k` lowest-energy bands are underactive
    RelativeRank { k: usize },
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        ClassificationPolicy::RelativeRank { k: DEFAULT_RANK_K }
    }
}

impl ClassificationPolicy {
    /// How a flagged band is described to the user
    pub fn missing_label(&self) -> &'static str {
        match self {
            ClassificationPolicy::AbsoluteThreshold { .. } => "no tone detected",
            ClassificationPolicy::RelativeRank { .. } => "comparatively weak",
        }
    }

    /// Indices of the flagged bands, ascending
    ///
    /// When `silent` is set every band is flagged, whatever the mode.
    pub fn classify(&self, energies: &[f64], silent: bool) -> Vec<usize> {
        if silent || energies.iter().all(|&e| e == 0.0) {
            return (0..energies.len()).collect();
        }

        let mut flagged: Vec<usize> = match *self {
            ClassificationPolicy::AbsoluteThreshold { epsilon } => energies
                .iter()
                .enumerate()
                .filter(|&(_, &e)| e <= epsilon)
                .map(|(i, _)| i)
                .collect(),
            ClassificationPolicy::RelativeRank { k } => {
                let mut order: Vec<usize> = (0..energies.len()).collect();
                // Stable sort keeps table order among equal energies
                order.sort_by(|&a, &b| energies[a].total_cmp(&energies[b]));
                order.truncate(k);
                order
            }
        };

        flagged.sort_unstable();
        flagged
    }
}

/// Scale energies to 0-100 against the session's own maximum
///
/// A zero maximum is treated as 1, so silence stays at 0.
pub fn normalize_energies(energies: &[f64]) -> Vec<f64> {
    let max = energies.iter().copied().fold(0.0_f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };
    energies.iter().map(|&e| (e / divisor * 100.0).max(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_threshold() {
        let policy = ClassificationPolicy::AbsoluteThreshold { epsilon: 1.0 };
        let energies = [0.0, 0.5, 50.0, 1.0, 1.5, 80.0, 20.0];
        assert_eq!(policy.classify(&energies, false), vec![0, 1, 3]);
    }

    #[test]
    fn test_relative_rank() {
        let policy = ClassificationPolicy::RelativeRank { k: 2 };
        let energies = [10.0, 90.0, 5.0, 70.0, 60.0, 40.0, 20.0];
        assert_eq!(policy.classify(&energies, false), vec![0, 2]);

        // Independent of absolute scale
        let scaled: Vec<f64> = energies.iter().map(|e| e * 1e-6).collect();
        assert_eq!(policy.classify(&scaled, false), vec![0, 2]);
    }

    #[test]
    fn test_relative_rank_ties_follow_table_order() {
        let policy = ClassificationPolicy::RelativeRank { k: 2 };
        let energies = [3.0, 1.0, 3.0, 1.0, 1.0, 9.0, 9.0];
        assert_eq!(policy.classify(&energies, false), vec![1, 3]);
    }

    #[test]
    fn test_relative_rank_k_larger_than_table() {
        let policy = ClassificationPolicy::RelativeRank { k: 10 };
        assert_eq!(policy.classify(&[1.0, 2.0, 3.0], false), vec![0, 1, 2]);
    }

    #[test]
    fn test_silence_flags_everything() {
        let zeros = [0.0; 7];
        for policy in [
            ClassificationPolicy::AbsoluteThreshold { epsilon: 0.0 },
            ClassificationPolicy::RelativeRank { k: 2 },
        ] {
            assert_eq!(policy.classify(&zeros, false).len(), 7);
            assert_eq!(policy.classify(&[5.0; 7], true).len(), 7);
        }
    }

    #[test]
    fn test_normalization_bounds() {
        let normalized = normalize_energies(&[10.0, 90.0, 5.0, 70.0, 60.0, 40.0, 20.0]);
        let max = normalized.iter().copied().fold(f64::MIN, f64::max);
        let min = normalized.iter().copied().fold(f64::MAX, f64::min);
        assert_eq!(max, 100.0);
        assert!(min >= 0.0);

        for raw in [vec![1e-9, 3e-9, 2e-9], vec![0.0, 0.0, 4.2], vec![123.0]] {
            let n = normalize_energies(&raw);
            assert_eq!(n.iter().copied().fold(f64::MIN, f64::max), 100.0);
            assert!(n.iter().all(|&e| e >= 0.0));
        }
    }

    #[test]
    fn test_normalization_of_silence() {
        assert_eq!(normalize_energies(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_policy_serde_shape() {
        let policy: ClassificationPolicy =
            serde_json::from_str(r#"{"mode":"absoluteThreshold","epsilon":1.0}"#).unwrap();
        assert_eq!(policy, ClassificationPolicy::AbsoluteThreshold { epsilon: 1.0 });

        let json = serde_json::to_string(&ClassificationPolicy::default()).unwrap();
        assert_eq!(json, r#"{"mode":"relativeRank","k":2}"#);
    }
}
