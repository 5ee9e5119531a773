//! repoclient - Main entry point

use clap::Parser;
use repoclient_cli::commands::init::ScopeSelection;
use repoclient_cli::{Cli, Commands};
use repoclient_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose: debug to console. Normal: warnings only, details go to
    // the log file. Environment variables take precedence either way.
    let log_config = if cli.verbose {
        LogConfig::builder()
            .level(LogLevel::Debug)
            .output(LogOutput::Console)
            .log_file_prefix("repoclient".to_string())
            .build()
    } else {
        LogConfig::builder()
            .level(LogLevel::Warn)
            .output(LogOutput::Console)
            .log_file_prefix("repoclient".to_string())
            .build()
    };
    let log_config = if std::env::vars().any(|(key, _)| key.starts_with("LOG_")) {
        LogConfig::from_env().unwrap_or(log_config)
    } else {
        log_config
    };

    // The client must keep working without logging.
    let _ = init_logging(&log_config);

    match execute_command(cli).await {
        Ok(result) => {
            if let Some(message) = result.message() {
                eprintln!("{}", message);
            }
            process::exit(result.exit_code());
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn execute_command(cli: Cli) -> repoclient_cli::Result<repoclient_cli::CommandResult> {
    match cli.command {
        Commands::Ingest { directories, note } => {
            repoclient_cli::commands::ingest::run(directories, note).await
        }

        Commands::Download {
            output_dir,
            object_id,
            interactive,
        } => repoclient_cli::commands::download::run(output_dir, object_id, interactive).await,

        Commands::List { failed_only } => repoclient_cli::commands::list::run(failed_only).await,

        Commands::Init {
            base,
            authentication,
            context,
            access_point,
            transfer_credentials,
            test_only,
        } => {
            let selection = ScopeSelection {
                base,
                authentication,
                context,
                access_point,
                transfer_credentials,
            };
            repoclient_cli::commands::init::run(selection, test_only).await
        }
    }
}
