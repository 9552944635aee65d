//! Filesystem disposition of a nuked tree.
//!
//! Everything here runs after settlement and record persistence, so
//! failures are logged and swallowed: the books are already correct and a
//! half-disposed directory is something an operator can clean up by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{NukeAction, NukeConfig};
use crate::tag;

/// Rename target for a nuked directory: the configured template with `%D`
/// replaced by the directory name, placed next to the original under the
/// same parent.
pub fn nuked_path(config: &NukeConfig, real: &Path) -> PathBuf {
    let name = real
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let nuked_name = config.nukedir_style.format.replace("%D", &name);
    match real.parent() {
        Some(parent) => parent.join(nuked_name),
        None => PathBuf::from(nuked_name),
    }
}

/// Applies the configured disposition to the tree at `real`, writing the
/// record ID wherever the directory ends up.
pub fn apply_disposition(config: &NukeConfig, real: &Path, id: &str) {
    let action = config.nukedir_style.action;
    if action != NukeAction::Keep {
        delete_contents(real);
    }

    if action == NukeAction::DeleteAll {
        if let Err(error) = fs::remove_dir(real) {
            log::error!("unable to remove nuked directory {}: {}", real.display(), error);
        }
    } else {
        rename_to_nuked(config, real, id);
    }
}

/// Renames a nuked directory back to its original name for an unnuke,
/// clearing the identity attribute first. A source that no longer exists
/// is not an error: the nuke may have deleted the tree outright.
pub fn restore_path(nuked: &Path, real: &Path) {
    tag::clear_nuke_id(nuked);
    if let Err(error) = fs::rename(nuked, real) {
        if error.kind() != io::ErrorKind::NotFound {
            log::error!(
                "unable to rename nuked directory {} -> {}: {}",
                nuked.display(),
                real.display(),
                error
            );
        }
    }
}

fn rename_to_nuked(config: &NukeConfig, real: &Path, id: &str) {
    let target = nuked_path(config, real);
    match fs::rename(real, &target) {
        Ok(()) => tag::write_nuke_id(&target, id),
        Err(error) => {
            log::error!(
                "unable to rename nuked directory {} -> {}: {}",
                real.display(),
                target.display(),
                error
            );
            // The directory keeps its old name; the ID still has to live
            // somewhere an unnuke can find it.
            tag::write_nuke_id(real, id);
        }
    }
}

/// Deletes every regular file under `dir`, then removes the emptied
/// subdirectories bottom-up. Anything else (symlinks, sockets) is left in
/// place, which makes the parent removal fail and get logged.
fn delete_contents(dir: &Path) {
    let mut subdirs = Vec::new();
    delete_files(dir, &mut subdirs);
    for subdir in subdirs.iter().rev() {
        if let Err(error) = fs::remove_dir(subdir) {
            log::error!("unable to remove nuked directory {}: {}", subdir.display(), error);
        }
    }
}

fn delete_files(dir: &Path, subdirs: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            log::error!("unable to read nuked directory contents {}: {}", dir.display(), error);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::error!("unable to read nuked directory contents {}: {}", dir.display(), error);
                continue;
            }
        };

        let path = entry.path();
        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                log::error!("unable to delete nuked file {}: {}", path.display(), error);
                continue;
            }
        };

        if metadata.is_dir() {
            subdirs.push(path.clone());
            delete_files(&path, subdirs);
        } else if metadata.is_file() {
            if let Err(error) = fs::remove_file(&path) {
                log::error!("unable to delete nuked file {}: {}", path.display(), error);
            }
        }
    }
}
