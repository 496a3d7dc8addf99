use std::path::{Path, PathBuf};

use crate::errors::SteerError;

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Read a UTF-8 file, naming the path in the error.
pub fn read_to_string(path: &Path) -> Result<String, SteerError> {
    std::fs::read_to_string(path).map_err(|e| SteerError::Generic {
        message: format!("Failed to read {}: {e}", path.display()),
    })
}

/// The file name of `path` without its extension, used to name rule sets.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
