//! Deduplication module.
//!
//! Provides:
//! - Per-category persisted sets of already-downloaded media identifiers
//! - Skip decisions for repeated runs against the same account

pub mod ledger;

pub use ledger::{DedupLedger, MediaCategory, LEDGER_FILE};
