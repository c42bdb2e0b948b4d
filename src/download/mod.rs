//! Download module for the fetch/cache engine.
//!
//! This module provides:
//! - Generic cursor-following pagination over cached snapshots
//! - Media asset resolution and downloading with dedup skips
//! - The per-account archiving session tying the pieces together

pub mod media;
pub mod paginate;
pub mod session;

pub use media::{asset_extension, resolve_media, MediaDownloader, MediaKind, ResolvedMedia};
pub use paginate::paginate;
pub use session::{AccountSession, Highlight};
