//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     insta-archiver                                    ║
║     Incremental Instagram account archiver            ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print the interactive command menu.
pub fn print_menu() {
    println!();
    println!("{}", style("Commands:").bold());
    println!("  1. Download user's info");
    println!("  2. Download user's posts");
    println!("  3. Download user's followers");
    println!("  4. Download user's following");
    println!("  5. Download user's stories");
    println!("  6. Download user's highlights");
    println!("  7. Exit");
    println!();
}
