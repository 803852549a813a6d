//! Scan history storage
//!
//! Saving happens after the result is already on screen. A failed save turns
//! into a notice on the outcome; it never takes the result away.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::outcome::{Notice, ScanOutcome};
use crate::report::{AnalysisRecord, AnalysisResult};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("You must be signed in to save your scan.")]
    NotAuthenticated,

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode scan record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Signed-in user the scan belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScan {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub created_at: Timestamp,
    pub result: AnalysisRecord,
}

impl SavedScan {
    fn new(result: &AnalysisResult, identity: Option<&Identity>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: identity.map(|who| who.user_id.clone()),
            created_at: Timestamp::now(),
            result: result.to_record(),
        }
    }
}

pub trait SessionStore {
    fn save(
        &mut self,
        result: &AnalysisResult,
        identity: Option<&Identity>,
    ) -> Result<SavedScan, SaveError>;

    /// Most recent scan saved for `user_id`
    fn latest(&self, user_id: &str) -> Result<Option<SavedScan>, SaveError>;
}

fn check_identity(require: bool, identity: Option<&Identity>) -> Result<(), SaveError> {
    if require && identity.is_none() {
        return Err(SaveError::NotAuthenticated);
    }
    Ok(())
}

fn newest_for<'a, I>(records: I, user_id: &str) -> Option<SavedScan>
where
    I: IntoIterator<Item = &'a SavedScan>,
{
    records
        .into_iter()
        .filter(|scan| scan.user_id.as_deref() == Some(user_id))
        .max_by_key(|scan| scan.created_at)
        .cloned()
}

/// Process-local history
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<SavedScan>,
    require_identity: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to save scans without a signed-in user
    pub fn requiring_identity() -> Self {
        Self {
            records: Vec::new(),
            require_identity: true,
        }
    }

    pub fn records(&self) -> &[SavedScan] {
        &self.records
    }
}

impl SessionStore for MemoryStore {
    fn save(
        &mut self,
        result: &AnalysisResult,
        identity: Option<&Identity>,
    ) -> Result<SavedScan, SaveError> {
        check_identity(self.require_identity, identity)?;
        let scan = SavedScan::new(result, identity);
        self.records.push(scan.clone());
        Ok(scan)
    }

    fn latest(&self, user_id: &str) -> Result<Option<SavedScan>, SaveError> {
        Ok(newest_for(&self.records, user_id))
    }
}

/// One JSON file per scan under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    require_identity: bool,
}

impl JsonFileStore {
    /// Open the store, creating `dir` if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SaveError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            require_identity: false,
        })
    }

    pub fn require_identity(mut self, require: bool) -> Self {
        self.require_identity = require;
        self
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    pub fn load(&self, id: Uuid) -> Result<SavedScan, SaveError> {
        let text = fs::read_to_string(self.path_for(id))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn load_all(&self) -> Result<Vec<SavedScan>, SaveError> {
        let mut scans = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<SavedScan>(&text) {
                Ok(scan) => scans.push(scan),
                Err(e) => log::warn!("Skipping unreadable scan record {}: {}", path.display(), e),
            }
        }
        Ok(scans)
    }
}

impl SessionStore for JsonFileStore {
    fn save(
        &mut self,
        result: &AnalysisResult,
        identity: Option<&Identity>,
    ) -> Result<SavedScan, SaveError> {
        check_identity(self.require_identity, identity)?;
        let scan = SavedScan::new(result, identity);
        let json = serde_json::to_string_pretty(&scan)?;
        fs::write(self.path_for(scan.id), json)?;
        log::debug!("Wrote scan record {}", scan.id);
        Ok(scan)
    }

    fn latest(&self, user_id: &str) -> Result<Option<SavedScan>, SaveError> {
        Ok(newest_for(&self.load_all()?, user_id))
    }
}

/// Save the outcome's result, recording failure as a notice
///
/// Returns the saved record when the store accepted it.
pub fn publish<S>(
    outcome: &mut ScanOutcome,
    store: &mut S,
    identity: Option<&Identity>,
) -> Option<SavedScan>
where
    S: SessionStore + ?Sized,
{
    match store.save(&outcome.result, identity) {
        Ok(scan) => {
            log::info!("Saved scan {}", scan.id);
            outcome.saved_id = Some(scan.id);
            Some(scan)
        }
        Err(e) => {
            log::warn!("Scan analyzed but not saved: {}", e);
            outcome.push_notice(Notice::SaveFailed(e.to_string()));
            None
        }
    }
}
