//! JSON snapshot files for ingest state kept between imports.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use sndb_core::CoreError;

/// Read `path` as JSON. A missing file is `None`.
pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CoreError> {
    let context = path.display().to_string();
    if !path.exists() {
        tracing::debug!(path = %context, "no snapshot, starting empty");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| CoreError::data_integrity(&context, format!("read failed: {e}")))?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| CoreError::data_integrity(&context, format!("invalid snapshot: {e}")))
}

/// Write `value` to `path` as pretty JSON, creating parent directories.
pub(crate) fn write<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    let context = path.display().to_string();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::data_integrity(&context, format!("serialize failed: {e}")))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| CoreError::data_integrity(&context, format!("create parent failed: {e}")))?;
    }
    std::fs::write(path, json)
        .map_err(|e| CoreError::data_integrity(&context, format!("write failed: {e}")))
}
