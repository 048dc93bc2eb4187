//! Common utilities shared across modules.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;

/// Get current UTC timestamp in seconds since UNIX_EPOCH.
pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

/// Make `path` absolute and lexically clean it.
///
/// `.` components are dropped and `..` pops the previous component. Symlinks
/// are not resolved, so the result names the path as the user spelled it.
pub fn normalize_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

/// Normalize a root path, canonicalizing it when it exists on disk.
///
/// Two spellings of one directory (`/tmp/x/../docs`, a symlinked parent)
/// resolve to a single catalog key.
pub fn normalize_root(path: &Path) -> io::Result<PathBuf> {
    let normalized = normalize_path(path)?;
    match normalized.canonicalize() {
        Ok(canonical) => Ok(canonical),
        Err(_) => Ok(normalized),
    }
}
