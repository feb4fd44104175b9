//! Directory-backed sample storage.
//!
//! Layout under the training-data root:
//!
//! ```text
//! training-data/
//! ├── hello_world/
//! │   ├── hello_world_2024-05-01T10-20-30.123456.json
//! │   └── hello_world_2024-05-01T10-20-31.654321.json
//! └── wave/
//!     └── wave_2024-05-01T10-21-00.000000.json
//! ```
//!
//! Each file holds one sample document exactly as it was posted. Saves go
//! through a temporary file in the target directory followed by a rename,
//! so a concurrent load never sees a half-written sample and two saves
//! with the same derived name leave exactly one complete file behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::models::{LoadReport, SampleEnvelope, SkippedFile};
use crate::naming::{gesture_dir_name, gesture_label, sample_file_name, SAMPLE_EXTENSION};

#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
}

impl SampleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the training-data root if it does not exist yet.
    pub fn ensure_root(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::io("failed to create", &self.root, e))
    }

    /// Persist one sample and return the path of the written file.
    ///
    /// An existing file with the same derived name is replaced.
    pub fn save(&self, sample: &SampleEnvelope) -> StoreResult<PathBuf> {
        let dir = self.root.join(gesture_dir_name(&sample.gesture));
        fs::create_dir_all(&dir).map_err(|e| StoreError::io("failed to create", &dir, e))?;

        let path = dir.join(sample_file_name(&sample.gesture, &sample.timestamp));
        let body = serde_json::to_vec_pretty(&sample.document).map_err(StoreError::Encode)?;
        write_atomic(&path, &body)?;

        if sample.landmarks.is_none() {
            debug!(path = %path.display(), "saved sample has no landmarks field");
        }
        debug!(gesture = %sample.gesture, path = %path.display(), "sample saved");
        Ok(path)
    }

    /// Read every sample under the root and group landmark payloads by
    /// gesture label.
    ///
    /// A missing root yields an empty report. Files that cannot be read or
    /// parsed, or that carry no `landmarks` field, are recorded in
    /// [`LoadReport::skipped`] instead of failing the scan.
    pub fn load_all(&self) -> StoreResult<LoadReport> {
        let mut report = LoadReport::default();
        match fs::read_dir(&self.root) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
            Err(e) => return Err(StoreError::io("failed to list", &self.root, e)),
        }

        let gestures = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in gestures {
            let entry = entry.map_err(|e| StoreError::Walk {
                path: self.root.clone(),
                source: e,
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let dir_name = entry.file_name().to_string_lossy();
            let samples = report
                .training_set
                .entry(gesture_label(&dir_name))
                .or_default();
            load_gesture_dir(entry.path(), samples, &mut report.skipped)?;
        }

        Ok(report)
    }
}

fn load_gesture_dir(
    dir: &Path,
    samples: &mut Vec<serde_json::Value>,
    skipped: &mut Vec<SkippedFile>,
) -> StoreResult<()> {
    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in files {
        let entry = match entry {
            Ok(entry) => entry,
            // depth 0 is the gesture directory itself
            Err(e) if e.depth() == 0 => {
                return Err(StoreError::Walk {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf());
                warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file()
            || !entry.file_name().to_string_lossy().ends_with(SAMPLE_EXTENSION)
        {
            continue;
        }

        match read_landmarks(entry.path()) {
            Ok(landmarks) => samples.push(landmarks),
            Err(reason) => {
                warn!(path = %entry.path().display(), %reason, "skipping sample file");
                skipped.push(SkippedFile {
                    path: entry.path().to_path_buf(),
                    reason,
                });
            }
        }
    }

    Ok(())
}

fn read_landmarks(path: &Path) -> Result<serde_json::Value, String> {
    let bytes = fs::read(path).map_err(|e| format!("read failed: {}", e))?;
    let mut value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid JSON: {}", e))?;
    value
        .get_mut("landmarks")
        .map(serde_json::Value::take)
        .ok_or_else(|| "no landmarks field".to_string())
}

/// Write `contents` to a sibling temporary file, then rename it over
/// `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    let result = (|| {
        let mut file =
            fs::File::create(&tmp).map_err(|e| StoreError::io("failed to create", &tmp, e))?;
        file.write_all(contents)
            .map_err(|e| StoreError::io("failed to write", &tmp, e))?;
        file.sync_all()
            .map_err(|e| StoreError::io("failed to sync", &tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| StoreError::io("failed to rename into", path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
