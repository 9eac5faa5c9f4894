//! Durable snapshot of the evaluation store.
//!
//! The whole store is written as one flat JSON object
//! (`{"0_hallucination": "correct", "0_notes": "...", ...}`) to a single
//! namespaced file, replaced wholesale on every save.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dialogue_review_core::EvaluationStore;
use tracing::{debug, info, warn};

use crate::StoreError;

/// Namespace of the snapshot entry; the file is `<state_dir>/<NAMESPACE>.json`.
pub const NAMESPACE: &str = "dialogueEvaluations";

/// File-backed snapshot of an [`EvaluationStore`].
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Snapshot living in `state_dir`. Nothing is touched until the first save.
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(format!("{NAMESPACE}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the store from the snapshot.
    ///
    /// An absent, unreadable or corrupt snapshot yields an empty store.
    pub fn load(&self) -> EvaluationStore {
        match self.read() {
            Ok(Some(store)) => {
                info!(
                    path = %self.path.display(),
                    evaluated = store.evaluated_count(),
                    "restored evaluation snapshot"
                );
                store
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no evaluation snapshot yet");
                EvaluationStore::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable evaluation snapshot");
                EvaluationStore::new()
            }
        }
    }

    fn read(&self) -> Result<Option<EvaluationStore>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let map = value.as_object().ok_or(StoreError::NotAnObject)?;
        Ok(Some(EvaluationStore::from_flat_map(map)))
    }

    /// Replace the snapshot with the full contents of `store`.
    ///
    /// Written to a sibling temp file first and renamed into place, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub fn save(&self, store: &EvaluationStore) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let json = serde_json::to_string(&store.to_flat_map())?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;

        info!(
            path = %self.path.display(),
            evaluated = store.evaluated_count(),
            "saved evaluation snapshot"
        );
        Ok(())
    }
}
