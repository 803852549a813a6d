//! Collaborators that receive a finished scan: history storage and enrichment

pub mod persistence;
pub mod enrichment;

pub use persistence::{publish, Identity, JsonFileStore, MemoryStore, SaveError, SavedScan, SessionStore};
pub use enrichment::{
    enrich_outcome, Enricher, Enrichment, EnrichmentError, EnrichmentRequest, HttpEnricher,
    LocalEnricher, MissingBandRef,
};
