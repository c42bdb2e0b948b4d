//! Snapshot persistence module.
//!
//! Provides:
//! - Typed logical keys for cacheable units
//! - Append-only timestamped snapshot storage with cache-or-fetch retrieval

pub mod key;
pub mod snapshots;

pub use key::{sanitize_segment, LogicalKey};
pub use snapshots::SnapshotStore;
