//! insta-archiver - incremental archiver for public Instagram accounts.
//!
//! This library fetches an account's data through a third-party API provider
//! and persists it to a local per-account directory tree.
//!
//! # Features
//!
//! - Profile, posts, stories, highlights, followers and following
//! - Append-only timestamped snapshots of every raw API payload
//! - Cache-or-fetch retrieval: cached snapshots are reused unless an update
//!   is requested
//! - Cursor-following pagination with per-resource termination
//! - A persistent dedup ledger so media is downloaded at most once across
//!   runs
//!
//! # Example
//!
//! ```no_run
//! use insta_archiver::{AccountSession, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.account.tokens = vec!["my-api-token".to_string()];
//!
//!     let mut session = AccountSession::open(&config, "someuser")?;
//!     session.export_profile(false)?;
//!     session.download_posts(Some(100), false)?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod download;
pub mod error;
pub mod output;
pub mod store;

// Re-exports for convenience
pub use api::{ClientPool, RocketClient};
pub use config::Config;
pub use dedup::{DedupLedger, MediaCategory};
pub use download::{AccountSession, MediaDownloader};
pub use error::{Error, Result};
pub use store::{LogicalKey, SnapshotStore};
