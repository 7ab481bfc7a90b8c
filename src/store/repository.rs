// Persistence store
// One JSON record on disk holds the full in-progress application plus the
// current step. Loading fails soft: an absent or unreadable record yields the
// empty template. Saving failures are logged and swallowed so a full disk or
// a read-only home directory never interrupts the wizard.

use crate::models::application::{ApplicationData, Step};
use crate::utils::path_resolver;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredApplication {
    #[serde(flatten)]
    data: ApplicationData,
    #[serde(default)]
    step: Step,
}

/// File-backed slot for the application record.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    path: PathBuf,
}

impl ApplicationRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository at the default platform data location.
    pub fn at_default_location() -> Self {
        Self::new(path_resolver::resolve_state_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record. Absence and corruption both yield the empty
    /// template at step 0; this never returns an error to the caller.
    pub fn load(&self) -> (ApplicationData, Step) {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "[PHASE: persistence] [STEP: load] No stored application at {:?}, starting fresh",
                    self.path
                );
                return (empty_application(), Step::default());
            }
            Err(e) => {
                warn!(
                    "[PHASE: persistence] [STEP: load] Failed to read {:?}: {}. Starting fresh",
                    self.path, e
                );
                return (empty_application(), Step::default());
            }
        };

        match serde_json::from_str::<StoredApplication>(&raw) {
            Ok(stored) => (stored.data, stored.step),
            Err(e) => {
                warn!(
                    "[PHASE: persistence] [STEP: load] Stored application is not valid JSON ({}). Starting fresh",
                    e
                );
                (empty_application(), Step::default())
            }
        }
    }

    /// Write the full record back. Best effort: failures are logged only.
    pub fn save(&self, data: &ApplicationData, step: Step) {
        let stored = StoredApplication {
            data: data.clone(),
            step,
        };

        let json = match serde_json::to_string(&stored) {
            Ok(json) => json,
            Err(e) => {
                error!(
                    "[PHASE: persistence] [STEP: save] Failed to serialize application: {}",
                    e
                );
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!(
                    "[PHASE: persistence] [STEP: save] Failed to create {:?}: {}",
                    parent, e
                );
                return;
            }
        }

        if let Err(e) = std::fs::write(&self.path, json) {
            error!(
                "[PHASE: persistence] [STEP: save] Failed to write {:?}: {}",
                self.path, e
            );
        }
    }
}

/// A deep, independent copy of the canonical empty application.
pub fn empty_application() -> ApplicationData {
    ApplicationData::default()
}
