//! Output module for console output.
//!
//! Provides:
//! - Colored console output
//! - The application banner and interactive menu

pub mod console;

pub use console::{print_banner, print_error, print_info, print_menu, print_success, print_warning};
