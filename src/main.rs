//! Sealpass - a minimal local secret store sealed with age
//!
//! One encrypted file per secret, categories as directories, all
//! cryptography delegated to the external age tool.

use clap::Parser;
use std::process::ExitCode;

use sealpass::cli::{run_command, Cli};

fn main() -> ExitCode {
    // Initialize logging
    if std::env::var("SEALPASS_DEBUG").is_ok() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    }

    // Usage, help, and unrecognized flags all render the help text and
    // exit successfully; only validated store errors exit non-zero.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match run_command(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31m✗ Error:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}
