//! Per-item and aggregated command outcomes.
//!
//! Every pipeline produces one `ItemOutcome`; the coordinator folds
//! them into a `CommandResult` whose exit code the binary hands to the
//! shell. Per-item errors are captured here, never thrown past the
//! coordinator.

use crate::error::CliError;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Successful,
    Failed,
}

/// Outcome of one processed item (one input directory)
#[derive(Debug)]
pub struct ItemOutcome {
    pub directory: PathBuf,
    /// Identifier of the registered digital object, when registration
    /// got that far
    pub identifier: Option<String>,
    pub error: Option<CliError>,
}

impl ItemOutcome {
    pub fn succeeded(directory: PathBuf, identifier: String) -> Self {
        Self {
            directory,
            identifier: Some(identifier),
            error: None,
        }
    }

    pub fn failed(directory: PathBuf, error: CliError) -> Self {
        Self {
            directory,
            identifier: None,
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregated outcome of a whole command invocation
#[derive(Debug)]
pub struct CommandResult {
    status: CommandStatus,
    message: Option<String>,
    items: Vec<ItemOutcome>,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            status: CommandStatus::Successful,
            message: None,
            items: Vec::new(),
        }
    }

    /// Fold per-item outcomes into one result. `operation` names the
    /// per-item action for the failure message, e.g. "ingest".
    pub fn aggregate(operation: &str, items: Vec<ItemOutcome>) -> Self {
        let failed = items.iter().filter(|i| i.is_failure()).count();
        if failed == 0 {
            Self {
                status: CommandStatus::Successful,
                message: None,
                items,
            }
        } else {
            Self {
                status: CommandStatus::Failed,
                message: Some(format!(
                    "{} of {} {}(s) failed!",
                    failed,
                    items.len(),
                    operation
                )),
                items,
            }
        }
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Successful
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The error of the first failed item
    pub fn first_failure(&self) -> Option<&CliError> {
        self.items.iter().find_map(|i| i.error.as_ref())
    }

    pub fn items(&self) -> &[ItemOutcome] {
        &self.items
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            CommandStatus::Successful => 0,
            CommandStatus::Failed => 1,
        }
    }
}
