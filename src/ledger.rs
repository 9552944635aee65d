//! User credit ledger collaborator.
//!
//! The engine never owns user accounts; it talks to whatever the daemon
//! uses through this trait. Credits live in named pools: the default pool
//! has the empty name, and sections configured with `separate_credits`
//! settle against a pool named after the section.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Credit operations the nuke engine needs.
///
/// Mutating operations return `false` when the UID is unknown so the
/// caller can log the skip; nothing is applied in that case.
pub trait UserLedger: Send + Sync {
    /// Current balance in `section` for `uid`, or `None` for unknown users.
    /// An unknown pool on a known user reads as zero.
    fn section_credits(&self, uid: u32, section: &str) -> Option<i64>;

    /// Debits unconditionally; balances may go negative.
    fn decr_section_credits_force(&self, uid: u32, section: &str, credits: i64) -> bool;

    /// Credits the balance back.
    fn incr_section_credits(&self, uid: u32, section: &str, credits: i64) -> bool;
}

/// In-memory ledger used by tests and by deployments that settle credits
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryUserLedger {
    users: RwLock<HashMap<u32, HashMap<String, i64>>>,
}

impl MemoryUserLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with no balances.
    pub fn add_user(&self, uid: u32) {
        self.users.write().entry(uid).or_default();
    }

    pub fn set_section_credits(&self, uid: u32, section: &str, credits: i64) {
        self.users
            .write()
            .entry(uid)
            .or_default()
            .insert(section.to_string(), credits);
    }
}

impl UserLedger for MemoryUserLedger {
    fn section_credits(&self, uid: u32, section: &str) -> Option<i64> {
        self.users
            .read()
            .get(&uid)
            .map(|pools| pools.get(section).copied().unwrap_or(0))
    }

    fn decr_section_credits_force(&self, uid: u32, section: &str, credits: i64) -> bool {
        let mut users = self.users.write();
        match users.get_mut(&uid) {
            Some(pools) => {
                *pools.entry(section.to_string()).or_insert(0) -= credits;
                true
            }
            None => false,
        }
    }

    fn incr_section_credits(&self, uid: u32, section: &str, credits: i64) -> bool {
        let mut users = self.users.write();
        match users.get_mut(&uid) {
            Some(pools) => {
                *pools.entry(section.to_string()).or_insert(0) += credits;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_users_read_none_and_reject_mutation() {
        let ledger = MemoryUserLedger::new();

        assert_eq!(ledger.section_credits(7, ""), None);
        assert!(!ledger.decr_section_credits_force(7, "", 100));
        assert!(!ledger.incr_section_credits(7, "", 100));
        assert_eq!(ledger.section_credits(7, ""), None);
    }

    #[test]
    fn known_user_with_untouched_pool_reads_zero() {
        let ledger = MemoryUserLedger::new();
        ledger.add_user(7);

        assert_eq!(ledger.section_credits(7, ""), Some(0));
        assert_eq!(ledger.section_credits(7, "GAMES"), Some(0));
    }

    #[test]
    fn forced_debit_can_go_negative() {
        let ledger = MemoryUserLedger::new();
        ledger.set_section_credits(7, "", 100);

        assert!(ledger.decr_section_credits_force(7, "", 250));
        assert_eq!(ledger.section_credits(7, ""), Some(-150));
    }

    #[test]
    fn increment_restores_a_debit() {
        let ledger = MemoryUserLedger::new();
        ledger.set_section_credits(7, "", 1000);

        ledger.decr_section_credits_force(7, "", 400);
        ledger.incr_section_credits(7, "", 400);
        assert_eq!(ledger.section_credits(7, ""), Some(1000));
    }

    #[test]
    fn pools_are_independent() {
        let ledger = MemoryUserLedger::new();
        ledger.set_section_credits(7, "", 100);
        ledger.set_section_credits(7, "GAMES", 500);

        ledger.decr_section_credits_force(7, "GAMES", 200);

        assert_eq!(ledger.section_credits(7, ""), Some(100));
        assert_eq!(ledger.section_credits(7, "GAMES"), Some(300));
    }
}
