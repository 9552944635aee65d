//! Historical transfer statistics collaborator.
//!
//! Nukes erase upload credit from the period the content arrived in, not
//! from the current period, so every adjustment carries the modification
//! time captured by the survey.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Upload statistics adjustments the nuke engine performs.
pub trait TransferStats: Send + Sync {
    /// Removes uploaded kilobytes and a file count from the stats period
    /// containing `when`, attributed to `section`.
    fn upload_decr(&self, uid: u32, kbytes: i64, when: DateTime<Utc>, section: &str, files: i32);

    /// Restores previously removed upload statistics.
    fn upload_incr(&self, uid: u32, kbytes: i64, when: DateTime<Utc>, section: &str, files: i32);
}

/// A single recorded adjustment, kept so tests can assert attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsAdjustment {
    pub uid: u32,
    pub kbytes: i64,
    pub files: i32,
    pub when: DateTime<Utc>,
    pub section: String,
}

#[derive(Debug, Default)]
struct MemoryStatsInner {
    totals: HashMap<(u32, String), (i64, i32)>,
    decrements: Vec<StatsAdjustment>,
    increments: Vec<StatsAdjustment>,
}

/// In-memory stats sink keeping running totals plus a journal of every
/// adjustment.
#[derive(Debug, Default)]
pub struct MemoryTransferStats {
    inner: Mutex<MemoryStatsInner>,
}

impl MemoryTransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_upload_total(&self, uid: u32, section: &str, kbytes: i64, files: i32) {
        self.inner
            .lock()
            .totals
            .insert((uid, section.to_string()), (kbytes, files));
    }

    /// Running `(kbytes, files)` total for a user in a section.
    pub fn upload_total(&self, uid: u32, section: &str) -> (i64, i32) {
        self.inner
            .lock()
            .totals
            .get(&(uid, section.to_string()))
            .copied()
            .unwrap_or((0, 0))
    }

    pub fn decrements(&self) -> Vec<StatsAdjustment> {
        self.inner.lock().decrements.clone()
    }

    pub fn increments(&self) -> Vec<StatsAdjustment> {
        self.inner.lock().increments.clone()
    }
}

impl TransferStats for MemoryTransferStats {
    fn upload_decr(&self, uid: u32, kbytes: i64, when: DateTime<Utc>, section: &str, files: i32) {
        let mut inner = self.inner.lock();
        let totals = inner.totals.entry((uid, section.to_string())).or_insert((0, 0));
        totals.0 -= kbytes;
        totals.1 -= files;
        inner.decrements.push(StatsAdjustment {
            uid,
            kbytes,
            files,
            when,
            section: section.to_string(),
        });
    }

    fn upload_incr(&self, uid: u32, kbytes: i64, when: DateTime<Utc>, section: &str, files: i32) {
        let mut inner = self.inner.lock();
        let totals = inner.totals.entry((uid, section.to_string())).or_insert((0, 0));
        totals.0 += kbytes;
        totals.1 += files;
        inner.increments.push(StatsAdjustment {
            uid,
            kbytes,
            files,
            when,
            section: section.to_string(),
        });
    }
}
