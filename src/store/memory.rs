//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::record::NukeRecord;
use crate::store::NukeStore;

#[derive(Debug, Default)]
struct Collections {
    nukes: HashMap<String, NukeRecord>,
    unnukes: HashMap<String, NukeRecord>,
}

/// Record store backed by process memory. Used in tests and anywhere
/// durability is provided by another layer.
#[derive(Debug, Default)]
pub struct MemoryNukeStore {
    inner: RwLock<Collections>,
}

impl MemoryNukeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nuke_count(&self) -> usize {
        self.inner.read().nukes.len()
    }

    pub fn unnuke_count(&self) -> usize {
        self.inner.read().unnukes.len()
    }
}

fn newest_for_path(records: &HashMap<String, NukeRecord>, path: &str) -> Option<NukeRecord> {
    records
        .values()
        .filter(|record| record.path == path)
        .max_by_key(|record| record.created_at)
        .cloned()
}

fn newest(records: &HashMap<String, NukeRecord>, count: usize) -> Vec<NukeRecord> {
    let mut records: Vec<NukeRecord> = records.values().cloned().collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(count);
    records
}

#[async_trait]
impl NukeStore for MemoryNukeStore {
    async fn lookup_nuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>> {
        Ok(self.inner.read().nukes.get(id).cloned())
    }

    async fn lookup_nuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>> {
        Ok(newest_for_path(&self.inner.read().nukes, path))
    }

    async fn lookup_unnuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>> {
        Ok(self.inner.read().unnukes.get(id).cloned())
    }

    async fn lookup_unnuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>> {
        Ok(newest_for_path(&self.inner.read().unnukes, path))
    }

    async fn add_nuke(&self, record: &NukeRecord) -> Result<()> {
        self.inner.write().nukes.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn del_nuke(&self, record: &NukeRecord) -> Result<()> {
        self.inner.write().nukes.remove(&record.id);
        Ok(())
    }

    async fn add_unnuke(&self, record: &NukeRecord) -> Result<()> {
        self.inner.write().unnukes.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn del_unnuke(&self, record: &NukeRecord) -> Result<()> {
        self.inner.write().unnukes.remove(&record.id);
        Ok(())
    }

    async fn newest_nukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        Ok(newest(&self.inner.read().nukes, count))
    }

    async fn newest_unnukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        Ok(newest(&self.inner.read().unnukes, count))
    }
}
