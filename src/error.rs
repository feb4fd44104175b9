//! Error types for the sample store.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The request body cannot be turned into a storable sample.
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A parsed sample could not be serialized back for writing.
    #[error("failed to encode sample: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl StoreError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// True when the failure was caused by the client's input rather than
    /// by the filesystem.
    pub fn is_bad_input(&self) -> bool {
        matches!(self, StoreError::InvalidSample(_) | StoreError::Json(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
