//! JSON file persistence for the station catalog.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::GasStation;

use super::error::CatalogError;

/// On-disk catalog contents with metadata.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCatalog {
    /// When the file was written.
    saved_at: DateTime<Utc>,
    /// Stations ordered by identifier.
    stations: Vec<GasStation>,
}

/// Location of the persisted catalog.
#[derive(Debug, Clone)]
pub struct CatalogFile {
    path: PathBuf,
}

impl CatalogFile {
    /// Create a catalog file handle for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load stations from disk.
    ///
    /// A missing file is an empty catalog. A file that exists but cannot be
    /// parsed is an error, so a corrupt file is never silently replaced.
    pub fn load(&self) -> Result<Vec<GasStation>, CatalogError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(CatalogError::File {
                    message: format!("failed to read {}: {}", self.path.display(), e),
                });
            }
        };

        let stored: StoredCatalog =
            serde_json::from_str(&contents).map_err(|e| CatalogError::File {
                message: format!("failed to parse {}: {}", self.path.display(), e),
            })?;

        Ok(stored.stations)
    }

    /// Save stations to disk.
    ///
    /// Writes to a sibling temporary file and renames it into place, so
    /// readers see either the old or the new catalog. Creates parent
    /// directories if they don't exist.
    pub fn save(&self, stations: &[GasStation]) -> Result<(), CatalogError> {
        let stored = StoredCatalog {
            saved_at: Utc::now(),
            stations: stations.to_vec(),
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::File {
                message: format!("failed to create catalog directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(&stored).map_err(|e| CatalogError::File {
            message: format!("failed to serialize catalog: {}", e),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CatalogError::File {
            message: format!("failed to write {}: {}", tmp.display(), e),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| CatalogError::File {
            message: format!("failed to replace {}: {}", self.path.display(), e),
        })?;

        Ok(())
    }

    /// Get the catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
