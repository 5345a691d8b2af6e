//! Binity updater entry point
//!
//! Strips the post-update startup switches, parses the command line and runs
//! the selected command. Errors are printed with a suggestion and exit code 1.

use anyhow::Result;
use binity_updater::cli::Cli;
use binity_updater::core::{UpdateError, user_friendly_error};
use binity_updater::upgrade::startup::strip_startup_switches;
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> Result<()> {
    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let (switches, args) = strip_startup_switches(std::env::args_os());
    let cli = Cli::parse_from(args);

    match cli.execute(switches).await {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast::<UpdateError>() {
                Ok(update_error) => user_friendly_error(update_error).display(),
                Err(other) => eprintln!("{}: {:#}", "error".red().bold(), other),
            }
            std::process::exit(1);
        }
    }
}
