//! Durable storage for nuke and unnuke records.
//!
//! Records live in two collections with the same shape: active nukes and
//! reversed ones. A record moves between them atomically from the engine's
//! point of view (delete from one, insert into the other).

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::NukeRecord;

mod file;
mod memory;

pub use file::FileNukeStore;
pub use memory::MemoryNukeStore;

/// Record store operations used by the engine.
///
/// Path lookups return the newest record when several share a path, which
/// happens once a directory has been nuked and unnuked more than once.
/// Deletions are idempotent: removing a record that is already gone is not
/// an error.
#[async_trait]
pub trait NukeStore: Send + Sync {
    async fn lookup_nuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>>;

    async fn lookup_nuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>>;

    async fn lookup_unnuke_by_id(&self, id: &str) -> Result<Option<NukeRecord>>;

    async fn lookup_unnuke_by_path(&self, path: &str) -> Result<Option<NukeRecord>>;

    async fn add_nuke(&self, record: &NukeRecord) -> Result<()>;

    async fn del_nuke(&self, record: &NukeRecord) -> Result<()>;

    async fn add_unnuke(&self, record: &NukeRecord) -> Result<()>;

    async fn del_unnuke(&self, record: &NukeRecord) -> Result<()>;

    /// Newest nukes first, at most `count` of them.
    async fn newest_nukes(&self, count: usize) -> Result<Vec<NukeRecord>>;

    /// Newest unnukes first, at most `count` of them.
    async fn newest_unnukes(&self, count: usize) -> Result<Vec<NukeRecord>>;
}

/// Shared handle to a record store.
pub type SharedNukeStore = Arc<dyn NukeStore>;
