//! Credit and stats settlement for a surveyed tree.
//!
//! Settlement happens before the tree is touched and is deliberately
//! forgiving: a user the ledger no longer knows about is logged and
//! skipped, never a reason to abort halfway through a multi-owner nuke.

use chrono::{DateTime, Utc};

use crate::aggregate::DirSurvey;
use crate::config::{NukeConfig, SectionConfig};
use crate::ledger::UserLedger;
use crate::record::{NukeRecord, Nukee};
use crate::stats::TransferStats;

/// Name of the credit pool a nuke in `section` settles against: the
/// section's own pool when it keeps separate credits, otherwise the
/// default pool.
pub fn credit_pool(section: Option<&SectionConfig>) -> &str {
    section
        .filter(|section| section.separate_credits)
        .map(|section| section.name.as_str())
        .unwrap_or("")
}

/// Debits every owner in the survey and returns the nukee list to record.
///
/// A tree below the configured empty threshold is penalised instead of
/// charged: with no owners at all, the directory owner pays the flat
/// empty-nuke amount; with owners, each is recorded at zero credits. A
/// tree above the threshold is charged per owner, either a percentage of
/// their current balance (truncated, floored at zero) or owned kilobytes
/// times the multiplier, which may push a balance negative.
pub fn take_credits(
    survey: &DirSurvey,
    multiplier: i32,
    is_percent: bool,
    config: &NukeConfig,
    section: Option<&SectionConfig>,
    ledger: &dyn UserLedger,
    path: &str,
) -> Vec<Nukee> {
    let pool = credit_pool(section);
    let mut nukees: Vec<Nukee> = survey
        .owners
        .iter()
        .map(|(&uid, totals)| Nukee {
            uid,
            kbytes: totals.kbytes,
            files: totals.files,
            credits: 0,
        })
        .collect();

    if survey.total_kbytes < config.nukedir_style.empty_kbytes {
        if nukees.is_empty() {
            let nukee = Nukee {
                uid: survey.dir_owner,
                kbytes: 0,
                files: 0,
                credits: config.empty_nuke,
            };
            debit(ledger, &nukee, pool, path);
            nukees.push(nukee);
        } else {
            for nukee in &nukees {
                debit(ledger, nukee, pool, path);
            }
        }
        return nukees;
    }

    for nukee in &mut nukees {
        if is_percent {
            match ledger.section_credits(nukee.uid, pool) {
                Some(balance) => {
                    let percent = f64::from(multiplier) / 100.0;
                    nukee.credits = ((balance as f64 * percent) as i64).max(0);
                    debit(ledger, nukee, pool, path);
                }
                None => {
                    log::error!("unable to update user {} after nuke of {}", nukee.uid, path);
                }
            }
        } else {
            nukee.credits = nukee.kbytes * i64::from(multiplier);
            debit(ledger, nukee, pool, path);
        }
    }
    nukees
}

fn debit(ledger: &dyn UserLedger, nukee: &Nukee, pool: &str, path: &str) {
    if !ledger.decr_section_credits_force(nukee.uid, pool, nukee.credits) {
        log::error!("unable to update user {} after nuke of {}", nukee.uid, path);
    }
}

/// Removes upload statistics for every nukee who owned actual content,
/// attributed to the survey's captured modification time.
pub fn take_stats(
    nukees: &[Nukee],
    mod_time: DateTime<Utc>,
    section: &str,
    stats: &dyn TransferStats,
) {
    for nukee in nukees {
        if nukee.kbytes > 0 {
            stats.upload_decr(nukee.uid, nukee.kbytes, mod_time, section, nukee.files);
        }
    }
}

/// Reverses a recorded nuke: every nukee gets their credits back in `pool`
/// and their upload statistics restored against the record's captured
/// modification time. Users the ledger no longer knows are logged and
/// skipped entirely.
pub fn restore_credits_and_stats(
    record: &NukeRecord,
    pool: &str,
    ledger: &dyn UserLedger,
    stats: &dyn TransferStats,
    path: &str,
) {
    for nukee in &record.nukees {
        if !ledger.incr_section_credits(nukee.uid, pool, nukee.credits) {
            log::error!("unable to update user {} after unnuke of {}", nukee.uid, path);
            continue;
        }
        stats.upload_incr(nukee.uid, nukee.kbytes, record.mod_time, &record.section, nukee.files);
    }
}
