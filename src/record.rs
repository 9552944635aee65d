//! Durable records of nuke and unnuke events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One user charged (or refunded) as part of a nuke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nukee {
    /// Owner UID the amounts are attributed to.
    pub uid: u32,
    /// Kilobytes this user owned inside the nuked tree.
    pub kbytes: i64,
    /// Regular files this user owned inside the nuked tree.
    pub files: i32,
    /// Credits debited from this user when the nuke was applied.
    pub credits: i64,
}

/// A nuke event, stored durably so it can later be reversed.
///
/// The same shape serves both collections: a record starts life as a nuke
/// and becomes an unnuke via [`NukeRecord::unnuke`] when it is reversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NukeRecord {
    /// Identifier also written to the directory's filesystem attribute.
    pub id: String,
    /// Virtual path the nuke was issued against.
    pub path: String,
    /// Name of the matched section, or empty when no section matched.
    pub section: String,
    /// Reason supplied by the operator. Replaced on unnuke.
    pub reason: String,
    /// Flat multiplier or percentage, depending on `is_percent`.
    pub multiplier: i32,
    pub is_percent: bool,
    /// Modification time of the directory, captured before any mutation.
    pub mod_time: DateTime<Utc>,
    /// When the record entered its current collection.
    pub created_at: DateTime<Utc>,
    /// Per-owner charges, ascending by UID.
    pub nukees: Vec<Nukee>,
}

impl NukeRecord {
    pub fn new(
        path: &str,
        section: &str,
        reason: &str,
        multiplier: i32,
        is_percent: bool,
        mod_time: DateTime<Utc>,
        nukees: Vec<Nukee>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(now),
            path: path.to_string(),
            section: section.to_string(),
            reason: reason.to_string(),
            multiplier,
            is_percent,
            mod_time,
            created_at: now,
            nukees,
        }
    }

    /// Turns a nuke record into its unnuke counterpart: the reason is
    /// replaced and the timestamp reflects the reversal, not the nuke.
    pub fn unnuke(&mut self, reason: &str) {
        self.reason = reason.to_string();
        self.created_at = Utc::now();
    }

    pub fn total_kbytes(&self) -> i64 {
        self.nukees.iter().map(|nukee| nukee.kbytes).sum()
    }

    pub fn total_files(&self) -> i32 {
        self.nukees.iter().map(|nukee| nukee.files).sum()
    }

    pub fn total_credits(&self) -> i64 {
        self.nukees.iter().map(|nukee| nukee.credits).sum()
    }
}

/// Generates a 24 character hex identifier: 8 characters of unix seconds
/// followed by 16 characters of random tail. Short enough to fit the
/// filesystem attribute written by [`crate::tag`].
fn generate_id(now: DateTime<Utc>) -> String {
    let tail = Uuid::new_v4().simple().to_string();
    format!("{:08x}{}", now.timestamp() as u32, &tail[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_nukees(nukees: Vec<Nukee>) -> NukeRecord {
        NukeRecord::new("/games/demo", "GAMES", "dupe", 3, false, Utc::now(), nukees)
    }

    #[test]
    fn generated_ids_are_24_hex_characters() {
        let record = record_with_nukees(Vec::new());
        assert_eq!(record.id.len(), 24);
        assert!(record.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = record_with_nukees(Vec::new());
        let b = record_with_nukees(Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unnuke_replaces_reason_and_refreshes_timestamp() {
        let mut record = record_with_nukees(Vec::new());
        let nuked_at = record.created_at;
        let id = record.id.clone();

        record.unnuke("was not a dupe");

        assert_eq!(record.reason, "was not a dupe");
        assert!(record.created_at >= nuked_at);
        assert_eq!(record.id, id);
    }

    #[test]
    fn totals_sum_over_all_nukees() {
        let record = record_with_nukees(vec![
            Nukee { uid: 10, kbytes: 2048, files: 2, credits: 4096 },
            Nukee { uid: 20, kbytes: 1024, files: 1, credits: 2048 },
        ]);

        assert_eq!(record.total_kbytes(), 3072);
        assert_eq!(record.total_files(), 3);
        assert_eq!(record.total_credits(), 6144);
    }
}
