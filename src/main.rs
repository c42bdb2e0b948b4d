//! insta-archiver - CLI entry point.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use console::Term;
use tracing_subscriber::{fmt, EnvFilter};

use insta_archiver::{
    cli::{ActionArg, Args},
    config::{validate_config, Config},
    download::AccountSession,
    error::{exit_codes, Error, Result},
    output::{print_banner, print_error, print_info, print_menu, print_success, print_warning},
    store::sanitize_segment,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::AccountNotFound(_)
                | Error::Remote(_)
                | Error::Authentication(_)
                | Error::RateLimited(_) => ExitCode::from(exit_codes::API_ERROR as u8),
                Error::MediaDownload(_) | Error::NotFound(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    // Merge CLI arguments into config and validate
    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let user = match &args.user {
        Some(user) => user.clone(),
        None => prompt_line("Enter the username: ")?,
    };

    let mut session = match AccountSession::open(&config, &user) {
        Ok(session) => session,
        Err(Error::AccountNotFound(name)) => {
            // Remove the directory skeleton created before resolution failed.
            if let Ok(dir_name) = sanitize_segment(user.trim()) {
                let _ = fs::remove_dir_all(config.output_directory().join(dir_name));
            }
            return Err(Error::AccountNotFound(name));
        }
        Err(e) => return Err(e),
    };

    print_info(&format!(
        "Archiving @{} (id {}) into {}",
        session.username(),
        session.user_id(),
        session.root().display()
    ));

    match args.action {
        Some(action) => run_action(&mut session, action, args.limit, args.update),
        None => interactive_loop(&mut session),
    }
}

/// Execute one archiving action against the session.
fn run_action(
    session: &mut AccountSession,
    action: ActionArg,
    limit: Option<usize>,
    update: bool,
) -> Result<()> {
    if action != ActionArg::Info && session.is_private(false)? {
        print_warning(
            "This account is private. Posts, followers, following, stories and highlights \
             cannot be archived",
        );
        return Ok(());
    }

    match action {
        ActionArg::Info => session.export_profile(update)?,
        ActionArg::Posts => session.download_posts(limit, update)?,
        ActionArg::Followers => session.export_followers(limit, update)?,
        ActionArg::Following => session.export_following(limit, update)?,
        ActionArg::Stories => session.download_stories(update)?,
        ActionArg::Highlights => session.download_highlights(update)?,
    }

    print_success("Done");
    Ok(())
}

/// Numbered menu loop; a failed command is reported and the menu resumes.
fn interactive_loop(session: &mut AccountSession) -> Result<()> {
    loop {
        print_menu();
        let choice = prompt_line("Enter the command: ")?;

        let action = match choice.as_str() {
            "1" => ActionArg::Info,
            "2" => ActionArg::Posts,
            "3" => ActionArg::Followers,
            "4" => ActionArg::Following,
            "5" => ActionArg::Stories,
            "6" => ActionArg::Highlights,
            "7" => return Ok(()),
            _ => {
                print_warning("Invalid command");
                continue;
            }
        };

        let update = prompt_line("Update data? (y/n): ")?.eq_ignore_ascii_case("y");

        let limit = match action {
            ActionArg::Posts | ActionArg::Followers | ActionArg::Following => {
                let raw = prompt_line("Enter the limit or leave empty to download all: ")?;
                if raw.is_empty() {
                    None
                } else {
                    match raw.parse() {
                        Ok(limit) => Some(limit),
                        Err(_) => {
                            print_warning("Invalid limit");
                            continue;
                        }
                    }
                }
            }
            _ => None,
        };

        if let Err(e) = run_action(session, action, limit, update) {
            print_error(&format!("{}", e));
        }
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    let term = Term::stdout();
    term.write_str(prompt)?;
    Ok(term.read_line()?.trim().to_string())
}
