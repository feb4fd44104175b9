//! Mapping between gesture labels and on-disk names.
//!
//! A label maps to its directory by replacing every `/` with `_`; listing
//! applies the inverse. The mapping is not injective: `a/b` and `a_b` share
//! the directory `a_b` and both read back as `a/b`.

use crate::error::{StoreError, StoreResult};

/// Extension of sample files. Only files with this suffix are loaded.
pub const SAMPLE_EXTENSION: &str = ".json";

/// Directory name for a gesture label.
pub fn gesture_dir_name(label: &str) -> String {
    label.replace('/', "_")
}

/// Gesture label recovered from a directory name.
pub fn gesture_label(dir_name: &str) -> String {
    dir_name.replace('_', "/")
}

/// Sample file name: `{dir_name}_{timestamp}.json` with `:` in the
/// timestamp turned into `-` so the name is valid on every platform.
pub fn sample_file_name(label: &str, timestamp: &str) -> String {
    format!(
        "{}_{}{}",
        gesture_dir_name(label),
        timestamp.replace(':', "-").replace('/', "_"),
        SAMPLE_EXTENSION
    )
}

/// Reject labels and timestamps that would not stay a single path
/// component below the training-data root.
pub fn validate_component(field: &str, value: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidSample(format!(
            "{} must not be empty",
            field
        )));
    }
    if value.contains('\\') || value.contains('\0') {
        return Err(StoreError::InvalidSample(format!(
            "{} contains a forbidden character: {:?}",
            field, value
        )));
    }
    let mapped = gesture_dir_name(value);
    if mapped == "." || mapped == ".." {
        return Err(StoreError::InvalidSample(format!(
            "{} is not a valid name: {:?}",
            field, value
        )));
    }
    Ok(())
}
