//! Nuke identity stored as a filesystem extended attribute.
//!
//! A renamed nuked directory carries the record ID of the nuke that owns
//! it, so a later unnuke can find the record even after the path changed.
//! The attribute is an optimisation only: every reader falls back to a
//! path lookup when it is missing, so all three operations here swallow
//! their errors.

use std::path::Path;

/// Attribute name carrying the owning record ID.
pub const NUKE_ID_ATTR: &str = "user.oxftpd.nukeid";

/// Record IDs never exceed this many bytes, see [`crate::record`].
pub const NUKE_ID_MAX_LEN: usize = 24;

/// Reads the record ID from `path`. Returns an empty string when the
/// attribute or the path itself does not exist; only unexpected failures
/// are logged.
#[cfg(unix)]
pub fn read_nuke_id(path: &Path) -> String {
    match xattr::get(path, NUKE_ID_ATTR) {
        Ok(Some(raw)) => String::from_utf8_lossy(&raw).into_owned(),
        Ok(None) => String::new(),
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                log::error!(
                    "error while reading filesystem attribute {} on {}: {}",
                    NUKE_ID_ATTR,
                    path.display(),
                    error
                );
            }
            String::new()
        }
    }
}

/// Writes the record ID to `path`. Failure is logged and swallowed.
#[cfg(unix)]
pub fn write_nuke_id(path: &Path, id: &str) {
    if let Err(error) = xattr::set(path, NUKE_ID_ATTR, id.as_bytes()) {
        log::error!(
            "error while writing filesystem attribute {} on {}: {}",
            NUKE_ID_ATTR,
            path.display(),
            error
        );
    }
}

/// Clears the record ID from `path`. A missing path is silently ignored;
/// any other failure is logged and swallowed.
#[cfg(unix)]
pub fn clear_nuke_id(path: &Path) {
    match xattr::remove(path, NUKE_ID_ATTR) {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            log::error!(
                "error while removing filesystem attribute {} on {}: {}",
                NUKE_ID_ATTR,
                path.display(),
                error
            );
        }
    }
}

#[cfg(not(unix))]
pub fn read_nuke_id(_path: &Path) -> String {
    String::new()
}

#[cfg(not(unix))]
pub fn write_nuke_id(_path: &Path, _id: &str) {}

#[cfg(not(unix))]
pub fn clear_nuke_id(_path: &Path) {}
