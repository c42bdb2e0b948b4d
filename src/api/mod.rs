//! Remote API module.
//!
//! This module provides:
//! - Blocking HTTP client for the third-party Instagram API provider
//! - Credentialed client pool with per-call instance selection
//! - Typed payload definitions per response shape

pub mod client;
pub mod types;

pub use client::{ClientPool, RocketClient};
pub use types::*;
