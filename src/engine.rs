//! Nuke orchestration.
//!
//! [`NukeEngine`] owns the three collaborators (record store, credit
//! ledger, transfer stats) and runs the full nuke and unnuke sequences
//! against them. Configuration is passed into every call so the daemon
//! can reload it between operations.

use std::path::Path;
use std::sync::Arc;

use crate::aggregate;
use crate::config::NukeConfig;
use crate::error::{NukingError, Result};
use crate::ledger::UserLedger;
use crate::mutate;
use crate::record::NukeRecord;
use crate::settle;
use crate::stats::TransferStats;
use crate::store::NukeStore;
use crate::tag;


pub struct NukeEngine {
    store: Arc<dyn NukeStore>,
    ledger: Arc<dyn UserLedger>,
    stats: Arc<dyn TransferStats>,
}

impl NukeEngine {
    pub fn new(
        store: Arc<dyn NukeStore>,
        ledger: Arc<dyn UserLedger>,
        stats: Arc<dyn TransferStats>,
    ) -> Self {
        Self { store, ledger, stats }
    }

    /// Nukes the directory at virtual `path`.
    ///
    /// The sequence is: survey the tree, settle credits and stats, purge
    /// any stale reversal record for the path, persist the new record,
    /// then apply the configured disposition to the directory. Only two
    /// failures abort, both before anything is mutated: an invalid
    /// multiplier and a tree that could not be fully surveyed. Everything
    /// after settlement is logged and carried through.
    pub async fn nuke(
        &self,
        config: &NukeConfig,
        path: &str,
        multiplier: i32,
        is_percent: bool,
        reason: &str,
    ) -> Result<NukeRecord> {
        if multiplier <= 0 || config.multiplier_max.is_some_and(|max| multiplier > max) {
            return Err(NukingError::InvalidMultiplier(multiplier));
        }

        let real = config.resolve(path);
        let survey = match aggregate::survey_directory(&real) {
            Ok(survey) => survey,
            Err(error) => {
                log::error!("error while nuking {}: {}", path, error);
                return Err(error);
            }
        };

        let section = config.section_for_path(path);
        let section_name = section.map(|section| section.name.as_str()).unwrap_or("");

        let nukees = settle::take_credits(
            &survey,
            multiplier,
            is_percent,
            config,
            section,
            self.ledger.as_ref(),
            path,
        );
        settle::take_stats(&nukees, survey.mod_time, section_name, self.stats.as_ref());

        // A directory nuked, unnuked and nuked again must not keep its old
        // reversal record around.
        if let Some(stale) = self.find_stale_unnuke(&real, path).await {
            if let Err(error) = self.store.del_unnuke(&stale).await {
                log::error!("unable to purge stale unnuke record for {}: {}", path, error);
            }
        }

        let record = NukeRecord::new(
            path,
            section_name,
            reason,
            multiplier,
            is_percent,
            survey.mod_time,
            nukees,
        );
        if let Err(error) = self.store.add_nuke(&record).await {
            log::error!("unable to persist nuke record for {}: {}", path, error);
        }

        mutate::apply_disposition(config, &real, &record.id);
        Ok(record)
    }

    /// Reverses a previous nuke of virtual `path`.
    ///
    /// The record is found through the identity attribute on the renamed
    /// directory, falling back to a path lookup; without a record the
    /// operation aborts before touching anything. Credits and stats are
    /// restored first, then the directory is renamed back, then the record
    /// moves to the unnuke collection with the new reason and the restored
    /// directory is tagged with its ID.
    pub async fn unnuke(
        &self,
        config: &NukeConfig,
        path: &str,
        reason: &str,
    ) -> Result<NukeRecord> {
        let real = config.resolve(path);
        let nuked = mutate::nuked_path(config, &real);
        let mut record = self.find_nuke(&nuked, path).await?;

        let pool = settle::credit_pool(config.section_by_name(&record.section));
        settle::restore_credits_and_stats(
            &record,
            pool,
            self.ledger.as_ref(),
            self.stats.as_ref(),
            path,
        );

        mutate::restore_path(&nuked, &real);

        if let Err(error) = self.store.del_nuke(&record).await {
            log::error!("unable to delete nuke record for {}: {}", path, error);
        }
        record.unnuke(reason);
        if let Err(error) = self.store.add_unnuke(&record).await {
            log::error!("unable to persist unnuke record for {}: {}", path, error);
        }
        tag::write_nuke_id(&real, &record.id);

        Ok(record)
    }

    /// Most recent nukes, newest first.
    pub async fn newest_nukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        self.store.newest_nukes(count).await
    }

    /// Most recent unnukes, newest first.
    pub async fn newest_unnukes(&self, count: usize) -> Result<Vec<NukeRecord>> {
        self.store.newest_unnukes(count).await
    }

    async fn find_nuke(&self, nuked: &Path, path: &str) -> Result<NukeRecord> {
        let id = tag::read_nuke_id(nuked);
        if !id.is_empty() {
            match self.store.lookup_nuke_by_id(&id).await {
                Ok(Some(record)) => return Ok(record),
                Ok(None) => {}
                Err(error) => {
                    log::error!("unable to look up nuke record for {}: {}", path, error);
                }
            }
        }
        match self.store.lookup_nuke_by_path(path).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(NukingError::RecordNotFound(path.into())),
            Err(error) => {
                log::error!("unable to look up nuke record for {}: {}", path, error);
                Err(NukingError::RecordNotFound(path.into()))
            }
        }
    }

    /// Best-effort lookup of a leftover reversal record; store failures
    /// are logged and treated as no record.
    async fn find_stale_unnuke(&self, real: &Path, path: &str) -> Option<NukeRecord> {
        let id = tag::read_nuke_id(real);
        if !id.is_empty() {
            match self.store.lookup_unnuke_by_id(&id).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(error) => {
                    log::error!("unable to look up unnuke record for {}: {}", path, error);
                }
            }
        }
        match self.store.lookup_unnuke_by_path(path).await {
            Ok(record) => record,
            Err(error) => {
                log::error!("unable to look up unnuke record for {}: {}", path, error);
                None
            }
        }
    }
}
