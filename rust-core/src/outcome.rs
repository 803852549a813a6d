//! What the user sees after a scan
//!
//! A completed scan always shows its result. Interruptions, failed saves and
//! failed enrichment ride along as notices and never hide the result.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::report::AnalysisResult;
use crate::sink::Enrichment;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum Notice {
    CaptureInterrupted(String),
    SaveFailed(String),
    EnrichmentFailed(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::CaptureInterrupted(msg) => {
                write!(f, "Scan ended early, results use the audio captured so far ({})", msg)
            }
            Notice::SaveFailed(msg) => write!(f, "Scan was not saved: {}", msg),
            Notice::EnrichmentFailed(msg) => write!(f, "Extra insights unavailable: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub result: AnalysisResult,

    /// Built from a capture that ended before its duration limit
    pub degraded: bool,

    pub notices: Vec<Notice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

impl ScanOutcome {
    pub fn new(result: AnalysisResult) -> Self {
        Self {
            result,
            degraded: false,
            notices: Vec::new(),
            saved_id: None,
            enrichment: None,
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        if matches!(notice, Notice::CaptureInterrupted(_)) {
            self.degraded = true;
        }
        self.notices.push(notice);
    }

    /// Notices rendered for display
    pub fn messages(&self) -> Vec<String> {
        self.notices.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandTable;
    use crate::report::{assemble, ClassificationPolicy};
    use crate::spectrum::AggregatedSpectrum;

    fn result() -> AnalysisResult {
        let mut means = vec![0.0; 64];
        means[10] = 1.0;
        assemble(
            &AggregatedSpectrum::from_means(means, 4, 8000.0),
            &BandTable::voice(),
            &ClassificationPolicy::default(),
        )
    }

    #[test]
    fn test_interruption_marks_degraded() {
        let mut outcome = ScanOutcome::new(result());
        outcome.push_notice(Notice::SaveFailed("offline".into()));
        assert!(!outcome.degraded);

        outcome.push_notice(Notice::CaptureInterrupted("device unplugged".into()));
        assert!(outcome.degraded);
        assert_eq!(outcome.notices.len(), 2);
        assert_eq!(outcome.messages()[0], "Scan was not saved: offline");
    }

    #[test]
    fn test_serialized_shape() {
        let mut outcome = ScanOutcome::new(result());
        outcome.push_notice(Notice::EnrichmentFailed("timeout".into()));

        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value["result"]["bandEnergies"].is_array());
        assert_eq!(value["degraded"], false);
        assert_eq!(value["notices"][0]["kind"], "enrichmentFailed");
        assert_eq!(value["notices"][0]["message"], "timeout");
        assert!(value.get("savedId").is_none());
    }
}
