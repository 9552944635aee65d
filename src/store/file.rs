//! Record store backed by JSON files.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/nukes/<id>.json
//! <root>/unnukes/<id>.json
//! ```
//!
//! One file per record keeps moves between collections simple and makes
//! records greppable on disk. Path lookups and listings scan a whole
//! collection; with one record per nuked directory that stays small.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{NukingError, Result};
use crate::record::NukeRecord;
use crate::store::NukeStore;

const NUKES_DIR: &str = "nukes";
const UNNUKES_DIR: &str = "unnukes";

/// File-backed record store.
#[derive(Debug, Clone)]
pub struct FileNukeStore {
    root: PathBuf,
}

impl FileNukeStore {
    /// Creates a store rooted at `root`. Collection directories are
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }

    async fn read_record(&self, collection: &str, id: &str) -> Result<Option<NukeRecord>> {
        let path = self.record_path(collection, id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(store_error(&path, "read", error)),
        };
        let record = serde_json::from_slice(&bytes).map_err(|error| {
            NukingError::Store(format!("unable to parse record {}: {error}", path.display()))
        })?;
        Ok(Some(record))
    }

    async fn write_record(&self, collection: &str, record: &NukeRecord) -> Result<()> {
        let path = self.record_path(collection, &record.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| store_error(parent, "create", error))?;
        }
        let serialized = serde_json::to_vec_pretty(record).map_err(|error| {
            NukingError::Store(format!("unable to serialize record {}: {error}", record.id))
        })?;
        tokio::fs::write(&path, serialized)
            .await
            .map_err(|error| store_error(&path, "write", error))
    }

    async fn remove_record(&self, collection: &str, id: &str) -> Result<()> {
        let path = self.record_path(collection, id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(store_error(&path, "remove", error)),
        }
    }

    /// Reads every record in a collection, newest first. Unreadable files
    /// are skipped with a warning so one corrupt record cannot wedge the
    /// whole store.
    async fn load_all(&self, collection: &str) -> Result<Vec<NukeRecord>> {
        let dir = self.root.join(collection);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(store_error(&dir, "read", error)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|error| store_error(&dir, "read", error))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    log::warn!("skipping unreadable nuke record {}: {}", path.display(), error);
                    continue;
                }
            };
            match serde_json::from_slice::<NukeRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(error) => {
                    log::warn!("skipping unreadable nuke record {}: {}", path.display(), error);
                }
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_by_path(&self, collection: &str, path: &str) -> Result<Option<NukeRecord>> {
        let records = self.load_all(collection).await?;
        Ok(records.into_iter().find(|record| record.path == path))
    }
}

fn store_error(path: &Path, action: &str, error: io::Error) -> NukingError {
    NukingError::Store(format!("unable to {action} {}: {error}", path.display()))
}

#[async_trait]
impl NukeStore for FileNukeStore {
    async fn lookup_nuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>> {
        self.read_record(NUKES_DIR, id).await
    }

    async fn lookup_nuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>> {
        self.find_by_path(NUKES_DIR, path).await
    }

    async fn lookup_unnuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>> {
        self.read_record(UNNUKES_DIR, id).await
    }

    async fn lookup_unnuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>> {
        self.find_by_path(UNNUKES_DIR, path).await
    }

    async fn add_nuke(&self, record: &NukeRecord) -> Result<()> {
        self.write_record(NUKES_DIR, record).await
    }

    async fn del_nuke(&self, record: &NukeRecord) -> Result<()> {
        self.remove_record(NUKES_DIR, &record.id).await
    }

    async fn add_unnuke(&self, record: &NukeRecord) -> Result<()> {
        self.write_record(UNNUKES_DIR, record).await
    }

    async fn del_unnuke(&self, record: &NukeRecord) -> Result<()> {
        self.remove_record(UNNUKES_DIR, &record.id).await
    }

    async fn newest_nukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        let mut records = self.load_all(NUKES_DIR).await?;
        records.truncate(count);
        Ok(records)
    }

    async fn newest_unnukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        let mut records = self.load_all(UNNUKES_DIR).await?;
        records.truncate(count);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Nukee;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn record(path: &str) -> NukeRecord {
        NukeRecord::new(
            path,
            "GAMES",
            "dupe",
            3,
            false,
            Utc::now(),
            vec![Nukee { uid: 10, kbytes: 1024, files: 1, credits: 3072 }],
        )
    }

    #[tokio::test]
    async fn records_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());
        let nuke = record("/games/foo");

        store.add_nuke(&nuke).await.unwrap();

        let found = store.lookup_nuke_by_id(&nuke.id).await.unwrap().unwrap();
        assert_eq!(found, nuke);
    }

    #[tokio::test]
    async fn missing_records_read_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());

        assert!(store.lookup_nuke_by_id("missing").await.unwrap().is_none());
        assert!(store.lookup_nuke_by_path("/games/foo").await.unwrap().is_none());
        assert!(store.newest_nukes(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());
        let nuke = record("/games/foo");

        store.del_nuke(&nuke).await.unwrap();
        store.add_nuke(&nuke).await.unwrap();
        store.del_nuke(&nuke).await.unwrap();
        store.del_nuke(&nuke).await.unwrap();

        assert!(store.lookup_nuke_by_id(&nuke.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn moves_between_collections() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());
        let mut nuke = record("/games/foo");

        store.add_nuke(&nuke).await.unwrap();
        store.del_nuke(&nuke).await.unwrap();
        nuke.unnuke("was fine");
        store.add_unnuke(&nuke).await.unwrap();

        assert!(store.lookup_nuke_by_id(&nuke.id).await.unwrap().is_none());
        let reversed = store.lookup_unnuke_by_id(&nuke.id).await.unwrap().unwrap();
        assert_eq!(reversed.reason, "was fine");
    }

    #[tokio::test]
    async fn newest_nukes_orders_and_limits() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());

        let mut oldest = record("/games/a");
        oldest.created_at = Utc::now() - Duration::hours(2);
        let mut middle = record("/games/b");
        middle.created_at = Utc::now() - Duration::hours(1);
        let newest = record("/games/c");

        store.add_nuke(&oldest).await.unwrap();
        store.add_nuke(&newest).await.unwrap();
        store.add_nuke(&middle).await.unwrap();

        let listed = store.newest_nukes(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].path, "/games/c");
        assert_eq!(listed[1].path, "/games/b");
    }

    #[tokio::test]
    async fn corrupt_records_are_skipped_in_scans() {
        let dir = TempDir::new().unwrap();
        let store = FileNukeStore::new(dir.path());
        let nuke = record("/games/foo");

        store.add_nuke(&nuke).await.unwrap();
        tokio::fs::write(dir.path().join("nukes").join("junk.json"), b"not json")
            .await
            .unwrap();

        let listed = store.newest_nukes(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, nuke.id);
    }
}
