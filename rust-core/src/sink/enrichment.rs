//! Optional second-pass annotation of a finished scan
//!
//! Enrichment adds a musical note name and listen/see/breathe suggestions. It
//! runs locally or against an HTTP endpoint. A failed enrichment leaves the base
//! result untouched and adds a notice.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::bands::BandTable;
use crate::outcome::{Notice, ScanOutcome};
use crate::report::AnalysisResult;

pub const SEE_PRACTICE: &str = "Harmonic Glyph Visualization";
pub const BREATHE_PRACTICE: &str = "5-5-5 technique";

#[derive(Error, Debug)]
pub enum EnrichmentError {
    #[error("Enrichment request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Enrichment endpoint is not configured")]
    NoEndpoint,
}

/// Missing band as annotated in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBandRef {
    pub band: String,

    /// `[min_hz, max_hz]`, absent for a band name the annotator does not know
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

/// Subset of the result sent for annotation: band names only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRequest {
    pub core_frequency_hz: Option<f64>,
    pub core_band: Option<String>,
    pub missing_bands: Vec<String>,
}

impl EnrichmentRequest {
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            core_frequency_hz: result.core_frequency_hz(),
            core_band: result.core_band().map(|band| band.name.to_string()),
            missing_bands: result
                .missing_bands()
                .iter()
                .map(|band| band.name.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSuggestion {
    pub listen: Vec<String>,
    pub see: String,
    pub breathe: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub core_frequency_hz: Option<f64>,
    pub core_note: String,
    #[serde(default)]
    pub core_band: Option<String>,
    pub missing: Vec<MissingBandRef>,
    pub suggestion: EnrichmentSuggestion,
}

pub trait Enricher {
    fn enrich(&self, request: &EnrichmentRequest) -> Result<Enrichment, EnrichmentError>;
}

/// Note letter for a band name of the canonical table
fn note_for_band(name: &str) -> Option<&'static str> {
    match name {
        "Root" => Some("C"),
        "Sacral" => Some("D"),
        "Solar Plexus" => Some("E"),
        "Heart" => Some("F"),
        "Throat" => Some("G"),
        "Third Eye" => Some("A"),
        "Crown" => Some("B"),
        _ => None,
    }
}

/// In-process annotator
///
/// Band ranges are looked up by name in its table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalEnricher {
    table: BandTable,
}

impl LocalEnricher {
    pub fn new(table: BandTable) -> Self {
        Self { table }
    }
}

impl Enricher for LocalEnricher {
    fn enrich(&self, request: &EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        let core_note = request
            .core_band
            .as_deref()
            .and_then(note_for_band)
            .map(|note| format!("{} note", note))
            .unwrap_or_else(|| "Unknown".to_string());

        let missing: Vec<MissingBandRef> = request
            .missing_bands
            .iter()
            .map(|name| MissingBandRef {
                band: name.clone(),
                range: self.table.by_name(name).map(|band| [band.min_hz, band.max_hz]),
            })
            .collect();

        let mut listen = Vec::with_capacity(2);
        if let Some(hz) = request.core_frequency_hz {
            listen.push(format!("{:.1} Hz", hz));
        }
        if let Some([min, max]) = missing.first().and_then(|gap| gap.range) {
            listen.push(format!("{}-{} Hz", min, max));
        }

        Ok(Enrichment {
            core_frequency_hz: request.core_frequency_hz,
            core_note,
            core_band: request.core_band.clone(),
            missing,
            suggestion: EnrichmentSuggestion {
                listen,
                see: SEE_PRACTICE.to_string(),
                breathe: BREATHE_PRACTICE.to_string(),
            },
        })
    }
}

/// Remote annotator reached with a JSON POST
pub struct HttpEnricher {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpEnricher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EnrichmentError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(EnrichmentError::NoEndpoint);
        }
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Enricher for HttpEnricher {
    fn enrich(&self, request: &EnrichmentRequest) -> Result<Enrichment, EnrichmentError> {
        log::debug!("POST {}", self.endpoint);
        let enrichment = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()?
            .error_for_status()?
            .json::<Enrichment>()?;
        Ok(enrichment)
    }
}

/// Attach enrichment to the outcome, or a notice when it fails
pub fn enrich_outcome<E>(outcome: &mut ScanOutcome, enricher: &E) -> bool
where
    E: Enricher + ?Sized,
{
    let request = EnrichmentRequest::from_result(&outcome.result);
    match enricher.enrich(&request) {
        Ok(enrichment) => {
            outcome.enrichment = Some(enrichment);
            true
        }
        Err(e) => {
            log::warn!("Falling back to base result: {}", e);
            outcome.push_notice(Notice::EnrichmentFailed(e.to_string()));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{assemble, ClassificationPolicy};
    use crate::spectrum::AggregatedSpectrum;

    fn heart_result() -> AnalysisResult {
        // 16 kHz, 256 bins: bin 40 is 1250 Hz
        let mut means = vec![0.0; 256];
        means[40] = 5.0;
        assemble(
            &AggregatedSpectrum::from_means(means, 4, 16000.0),
            &BandTable::voice(),
            &ClassificationPolicy::AbsoluteThreshold { epsilon: 1e-4 },
        )
    }

    #[test]
    fn test_local_enrichment() {
        let request = EnrichmentRequest::from_result(&heart_result());
        assert_eq!(request.core_band.as_deref(), Some("Heart"));
        assert_eq!(request.missing_bands[0], "Root");

        let enrichment = LocalEnricher::default().enrich(&request).unwrap();
        assert_eq!(enrichment.core_note, "F note");
        assert_eq!(enrichment.suggestion.listen, vec!["1250.0 Hz", "63-250 Hz"]);
        assert_eq!(enrichment.suggestion.see, "Harmonic Glyph Visualization");
        assert_eq!(enrichment.suggestion.breathe, "5-5-5 technique");
        assert_eq!(enrichment.missing.len(), request.missing_bands.len());
        assert_eq!(enrichment.missing[0].range, Some([63.0, 250.0]));
    }

    #[test]
    fn test_unknown_core() {
        let request = EnrichmentRequest {
            core_frequency_hz: None,
            core_band: None,
            missing_bands: Vec::new(),
        };
        let enrichment = LocalEnricher::default().enrich(&request).unwrap();
        assert_eq!(enrichment.core_note, "Unknown");
        assert!(enrichment.suggestion.listen.is_empty());
    }

    #[test]
    fn test_request_wire_shape() {
        let value = serde_json::to_value(EnrichmentRequest::from_result(&heart_result())).unwrap();
        assert_eq!(value["coreFrequencyHz"], 1250.0);
        assert_eq!(value["coreBand"], "Heart");
        assert_eq!(value["missingBands"][0], "Root");
    }

    #[test]
    fn test_unknown_missing_band_has_no_range() {
        let request = EnrichmentRequest {
            core_frequency_hz: Some(300.0),
            core_band: Some("Sacral".into()),
            missing_bands: vec!["Spleen".into(), "Crown".into()],
        };
        let enrichment = LocalEnricher::new(BandTable::note_windows()).enrich(&request).unwrap();
        assert_eq!(enrichment.core_note, "D note");
        assert_eq!(enrichment.missing[0].range, None);
        assert_eq!(enrichment.missing[1].range, Some([1100.0, 1400.0]));
        assert_eq!(enrichment.suggestion.listen, vec!["300.0 Hz"]);
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        assert!(matches!(
            HttpEnricher::new("  ", Duration::from_secs(1)),
            Err(EnrichmentError::NoEndpoint)
        ));
    }

    #[test]
    fn test_failed_enrichment_keeps_result() {
        // Nothing listens on port 9 of the loopback interface
        let enricher =
            HttpEnricher::new("http://127.0.0.1:9/analyze", Duration::from_millis(500)).unwrap();
        let mut outcome = ScanOutcome::new(heart_result());

        assert!(!enrich_outcome(&mut outcome, &enricher));
        assert!(outcome.enrichment.is_none());
        assert!(matches!(outcome.notices[0], Notice::EnrichmentFailed(_)));
        assert_eq!(outcome.result, heart_result());
    }

    #[test]
    fn test_local_enrichment_attaches() {
        let mut outcome = ScanOutcome::new(heart_result());
        assert!(enrich_outcome(&mut outcome, &LocalEnricher::default()));
        assert!(outcome.notices.is_empty());
        assert_eq!(outcome.enrichment.unwrap().core_note, "F note");
    }
}
