//! Nuke and unnuke support for a multi-user FTP site.
//!
//! A nuke punishes a bad upload: the directory's content is charged back
//! to whoever uploaded it, the upload disappears from transfer stats, and
//! the directory itself is deleted or renamed out of the way. An unnuke
//! reverses all of it from the durable record the nuke left behind.
//!
//! [`engine::NukeEngine`] orchestrates the whole sequence against three
//! pluggable collaborators: a [`store::NukeStore`] for records, a
//! [`ledger::UserLedger`] for credits and a [`stats::TransferStats`] sink
//! for historical upload totals. Configuration is handed to each call, so
//! nothing in the crate holds global state.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod mutate;
pub mod record;
pub mod settle;
pub mod stats;
pub mod store;
pub mod tag;

pub use config::{NukeAction, NukeConfig, NukedirStyle, SectionConfig};
pub use engine::NukeEngine;
pub use error::{NukingError, Result};
pub use ledger::{MemoryUserLedger, UserLedger};
pub use record::{NukeRecord, Nukee};
pub use stats::{MemoryTransferStats, StatsAdjustment, TransferStats};
pub use store::{FileNukeStore, MemoryNukeStore, NukeStore, SharedNukeStore};
