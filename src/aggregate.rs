//! Ownership survey of a directory tree.
//!
//! Before a nuke touches anything it walks the whole tree once and totals
//! regular file sizes per owner. The walk is strict: any entry it cannot
//! read aborts the nuke, because charging users for a tree that was only
//! partially surveyed would settle the wrong amounts.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::{NukingError, Result};

/// Running totals for a single owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnerTotals {
    pub kbytes: i64,
    pub files: i32,
}

/// Everything the walk learned about the tree before any mutation.
#[derive(Debug)]
pub struct DirSurvey {
    /// Totals keyed by owner UID, ascending.
    pub owners: BTreeMap<u32, OwnerTotals>,
    /// Sum of all per-owner kilobytes.
    pub total_kbytes: i64,
    /// UID owning the directory itself.
    pub dir_owner: u32,
    /// Modification time of the directory, captured before the tree is
    /// touched so stats can be attributed to when content arrived.
    pub mod_time: DateTime<Utc>,
}

/// Walks `path` recursively and aggregates regular file sizes per owner.
///
/// Sizes are converted to whole kilobytes per file, so a 1500 byte file
/// counts as 1 KB and an empty file as 0 KB but still one file. Entries
/// whose name starts with `.` are skipped wherever they appear, and a
/// skipped directory hides its entire subtree. Directories and symlinks
/// contribute nothing themselves.
pub fn survey_directory(path: &Path) -> Result<DirSurvey> {
    let metadata = fs::symlink_metadata(path).map_err(|source| fatal(path, source))?;
    let mod_time = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .map_err(|source| fatal(path, source))?;

    let mut survey = DirSurvey {
        owners: BTreeMap::new(),
        total_kbytes: 0,
        dir_owner: owner_uid(&metadata),
        mod_time,
    };
    walk(path, &mut survey).map_err(|source| fatal(path, source))?;
    Ok(survey)
}

fn walk(dir: &Path, survey: &mut DirSurvey) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let metadata = fs::symlink_metadata(&path)?;
        if metadata.is_dir() {
            walk(&path, survey)?;
        } else if metadata.is_file() {
            let kbytes = metadata.len() as i64 / 1024;
            let totals = survey.owners.entry(owner_uid(&metadata)).or_default();
            totals.kbytes += kbytes;
            totals.files += 1;
            survey.total_kbytes += kbytes;
        }
    }
    Ok(())
}

fn fatal(path: &Path, source: io::Error) -> NukingError {
    NukingError::Aggregate { path: path.to_path_buf(), source }
}

#[cfg(unix)]
fn owner_uid(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.uid()
}

#[cfg(not(unix))]
fn owner_uid(_metadata: &fs::Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, bytes: usize) {
        let mut file = File::create(dir.join(name)).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn totals_regular_files_in_whole_kilobytes() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a.bin", 2048);
        write_file(dir.path(), "b.bin", 1500);
        write_file(dir.path(), "empty.bin", 0);

        let survey = survey_directory(dir.path()).unwrap();

        // 2 KB + 1 KB + 0 KB, rounded down per file.
        assert_eq!(survey.total_kbytes, 3);
        assert_eq!(survey.owners.len(), 1);
        let totals = survey.owners.values().next().unwrap();
        assert_eq!(totals.kbytes, 3);
        assert_eq!(totals.files, 3);
    }

    #[test]
    fn descends_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("cd1");
        fs::create_dir(&sub).unwrap();
        write_file(dir.path(), "top.bin", 1024);
        write_file(&sub, "inner.bin", 2048);

        let survey = survey_directory(dir.path()).unwrap();

        assert_eq!(survey.total_kbytes, 3);
        assert_eq!(survey.owners.values().next().unwrap().files, 2);
    }

    #[test]
    fn skips_hidden_entries_and_their_subtrees() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "counted.bin", 1024);
        write_file(dir.path(), ".hidden.bin", 4096);

        let hidden_dir = dir.path().join(".stash");
        fs::create_dir(&hidden_dir).unwrap();
        write_file(&hidden_dir, "inside.bin", 8192);

        let survey = survey_directory(dir.path()).unwrap();

        assert_eq!(survey.total_kbytes, 1);
        assert_eq!(survey.owners.values().next().unwrap().files, 1);
    }

    #[cfg(unix)]
    #[test]
    fn ignores_symlinks() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "real.bin", 1024);
        std::os::unix::fs::symlink(dir.path().join("real.bin"), dir.path().join("link.bin"))
            .unwrap();

        let survey = survey_directory(dir.path()).unwrap();

        assert_eq!(survey.total_kbytes, 1);
        assert_eq!(survey.owners.values().next().unwrap().files, 1);
    }

    #[test]
    fn empty_directory_surveys_to_zero_owners() {
        let dir = TempDir::new().unwrap();

        let survey = survey_directory(dir.path()).unwrap();

        assert!(survey.owners.is_empty());
        assert_eq!(survey.total_kbytes, 0);
    }

    #[cfg(unix)]
    #[test]
    fn captures_directory_owner() {
        let dir = TempDir::new().unwrap();
        let survey = survey_directory(dir.path()).unwrap();

        use std::os::unix::fs::MetadataExt;
        let expected = fs::metadata(dir.path()).unwrap().uid();
        assert_eq!(survey.dir_owner, expected);
    }

    #[test]
    fn captures_directory_mod_time() {
        let dir = TempDir::new().unwrap();
        let survey = survey_directory(dir.path()).unwrap();

        let expected = DateTime::<Utc>::from(fs::metadata(dir.path()).unwrap().modified().unwrap());
        assert_eq!(survey.mod_time, expected);
    }

    #[test]
    fn missing_path_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = survey_directory(&dir.path().join("gone"));

        assert!(matches!(result, Err(NukingError::Aggregate { .. })));
    }
}
