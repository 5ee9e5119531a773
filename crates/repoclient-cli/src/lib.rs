//! Repository client library
//!
//! Command-line client for a remote research-data repository:
//!
//! - **Ingest**: register metadata for one or more directories and move
//!   their content into the repository (`repoclient ingest`)
//! - **Download**: retrieve a previously ingested digital object
//!   (`repoclient download`)
//! - **Listing**: show the group's ingest requests (`repoclient list`)
//! - **Setup**: validate and repair the client settings
//!   (`repoclient init`)

pub mod api;
pub mod commands;
pub mod error;
pub mod ingest;
pub mod outcome;
pub mod plugin;
pub mod progress;
pub mod settings;
pub mod transfer;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use outcome::{CommandResult, CommandStatus, ItemOutcome};
pub use settings::SettingsBundle;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repoclient - research-data repository client
#[derive(Parser, Debug)]
#[command(name = "repoclient")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register and upload one or more directories
    Ingest {
        /// Input directories, one digital object each
        #[arg(required = true)]
        directories: Vec<PathBuf>,

        /// Free-text note stored with each digital object
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// Download a digital object
    Download {
        /// Directory the downloaded content is written to
        output_dir: PathBuf,

        /// Identifier of the digital object; selected interactively
        /// when omitted
        #[arg(short, long)]
        object_id: Option<String>,

        /// Select the digital object interactively
        #[arg(short, long)]
        interactive: bool,
    },

    /// List ingest requests of the configured group
    List {
        /// Only show failed ingests
        #[arg(long)]
        failed_only: bool,
    },

    /// Validate and repair the client settings
    Init {
        /// Validate the server base scope
        #[arg(long)]
        base: bool,

        /// Validate the authentication scope
        #[arg(long)]
        authentication: bool,

        /// Validate the group/investigation context scope
        #[arg(long)]
        context: bool,

        /// Validate the access point scope
        #[arg(long)]
        access_point: bool,

        /// Validate the transfer credentials scope
        #[arg(long)]
        transfer_credentials: bool,

        /// Only test, never prompt for repairs
        #[arg(long)]
        test_only: bool,
    },
}
