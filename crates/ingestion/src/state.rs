//! Resume state: per-bank continuation token and fetched count
//!
//! The whole document is rewritten after every batch. Writes go to a sibling
//! temp file that is renamed over the target, so a crash leaves either the old
//! or the new state on disk.

use crate::errors::IngestionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cursor for one bank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    /// Opaque upstream cursor; `None` before the first fetch or once exhausted
    #[serde(rename = "continuation_token", default)]
    pub token: Option<String>,

    #[serde(rename = "fetched", default)]
    pub fetched_count: u64,
}

impl SourceState {
    /// A null token after items were counted means upstream ran dry
    pub fn is_exhausted(&self) -> bool {
        self.token.is_none() && self.fetched_count > 0
    }
}

/// Resume state for every bank, keyed by bank id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeState {
    sources: BTreeMap<String, SourceState>,
}

impl ResumeState {
    pub fn get(&self, source_id: &str) -> SourceState {
        self.sources.get(source_id).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, source_id: &str, state: SourceState) {
        self.sources.insert(source_id.to_string(), state);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// JSON file holding the [`ResumeState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state file; a missing file is an empty state
    pub fn load(&self) -> Result<ResumeState, IngestionError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file, starting fresh");
            return Ok(ResumeState::default());
        }

        let raw = fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| IngestionError::State {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Rewrite the state file in full
    pub fn save(&self, state: &ResumeState) -> Result<(), IngestionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let body = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = File::create(&tmp_path)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
