//! Default locations of the database and list files.

use f10_data::{DataError, SqliteStore};
use std::path::{Path, PathBuf};

/// Get the default data directory.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/f10/`
/// - macOS: `~/Library/Application Support/f10/`
/// - Windows: `%APPDATA%\f10\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("f10")
}

/// Get the default database path inside a data directory.
pub(crate) fn default_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("f10.db")
}

/// Open the store, creating the parent directory if needed.
pub(crate) fn open_store(path: &Path) -> Result<SqliteStore, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStore::new(path)
}
