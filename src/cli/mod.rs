//! Command-line interface.
//!
//! One store operation per invocation. The dispatcher owns precondition
//! ordering: probe the encryption tool (for the operations that use
//! it), validate the name, require the master key, check existence,
//! then perform the single effect.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;

use crate::age::{AgeBackend, AgeCli};
use crate::clipboard::{self, CommandSink};
use crate::generate::{self as genpw, Pattern};
use crate::paths::{PathError, SecretName};
use crate::prompt::{self, Prompter, TermPrompter};
use crate::store::Store;
use crate::Config;

/// Sealpass - minimal local secret store sealed with age
#[derive(Parser)]
#[command(name = "sealpass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store directory (default: $SEALPASS_DIR or the user data dir)
    #[arg(short, long, global = true)]
    pub store: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a new secret (generated or entered manually)
    Add {
        /// Secret name, e.g. work/vpn
        name: Option<String>,
    },

    /// Copy a secret to the clipboard, clearing it after a timeout
    #[command(alias = "cp")]
    Copy {
        /// Secret name
        name: Option<String>,
    },

    /// Delete a secret after confirmation
    #[command(alias = "rm")]
    Delete {
        /// Secret name
        name: Option<String>,
    },

    /// Create the store's master key pair
    GenerateMasterKey,

    /// List all stored secret names
    #[command(alias = "ls")]
    List,

    /// Print a secret to stdout
    Show {
        /// Secret name
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// CLI output helpers
pub struct Output;

impl Output {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }
}

fn required_name(name: Option<String>) -> crate::Result<SecretName> {
    let raw = name.ok_or(PathError::MissingArgument)?;
    Ok(SecretName::parse(&raw)?)
}

fn open_store(cli_store: &Option<String>, config: &Config) -> crate::Result<Store> {
    let root = cli_store
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.store_dir.clone());
    Ok(Store::open(root, Box::new(AgeCli))?)
}

/// Run the CLI command
pub fn run_command(cli: Cli) -> crate::Result<()> {
    let config = Config::from_env();

    match cli.command {
        Commands::GenerateMasterKey => {
            AgeCli.ensure_available()?;
            let store = open_store(&cli.store, &config)?;

            store.generate_master_key()?;
            Output::success(&format!(
                "Master key created in {}",
                store.root().display()
            ));
            Ok(())
        }

        Commands::Add { name } => {
            let name = required_name(name)?;
            AgeCli.ensure_available()?;
            let store = open_store(&cli.store, &config)?;
            let prompter = TermPrompter;

            let secret = if prompter.confirm("Generate a password?")? {
                let pattern = Pattern::parse(&config.pattern);
                let secret = genpw::generate(&pattern, config.password_length)?;
                // Echo once so the user sees what was stored.
                println!(
                    "  {}",
                    String::from_utf8_lossy(secret.expose()).bold()
                );
                secret
            } else {
                prompt::read_secret_confirmed(
                    &prompter,
                    &format!("Password for '{}'", name),
                )?
            };

            store.add(&name, &secret)?;
            Output::success(&format!("Stored '{}'", name));
            Ok(())
        }

        Commands::Show { name } => {
            let name = required_name(name)?;
            AgeCli.ensure_available()?;
            let store = open_store(&cli.store, &config)?;

            let secret = store.read(&name)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(secret.expose())?;
            if !secret.expose().ends_with(b"\n") {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }

        Commands::Copy { name } => {
            let name = required_name(name)?;
            AgeCli.ensure_available()?;
            let store = open_store(&cli.store, &config)?;

            let secret = store.read(&name)?;
            let sink = Arc::new(CommandSink::new(&config.clip_command)?);
            let guard = clipboard::copy(sink, &secret, config.clip_timeout)?;

            match config.clip_timeout {
                Some(secs) => Output::success(&format!(
                    "Copied '{}' to clipboard (clears in {}s)",
                    name, secs
                )),
                None => Output::success(&format!("Copied '{}' to clipboard", name)),
            }

            // Stay resident until the clear fires; exiting earlier
            // would leave the secret on the clipboard.
            if let Some(guard) = guard {
                guard.wait();
            }
            Ok(())
        }

        Commands::Delete { name } => {
            let name = required_name(name)?;
            let store = open_store(&cli.store, &config)?;

            store.delete(&name, &TermPrompter)?;
            Ok(())
        }

        Commands::List => {
            let store = open_store(&cli.store, &config)?;

            for name in store.list()? {
                println!("{}", name);
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sealpass", &mut io::stdout());
            Ok(())
        }
    }
}
