//! Repair strategies for invalid settings.
//!
//! Validation itself never talks to the user; when a scope fails, the
//! resolver asks its `RepairStrategy` for a replacement value. The CLI
//! plugs in `InteractiveRepair`; non-interactive callers use `NoRepair`
//! and get a hard failure instead of a prompt.

use crate::error::{CliError, Result};
use crate::settings::bundle::SettingsKey;
use crate::settings::resolver::Choice;
use colored::Colorize;
use inquire::{Confirm, Password, Select, Text};

/// Supplies replacement values for settings that failed validation
pub trait RepairStrategy {
    /// Provide a new value for `key`. `choices` holds the valid values
    /// reported by the service, or is empty for free-form keys.
    fn supply(&self, key: SettingsKey, current: Option<&str>, choices: &[Choice])
        -> Result<String>;

    /// Ask whether repaired settings should be persisted
    fn confirm_save(&self) -> Result<bool>;
}

/// Prompts the user on the terminal
pub struct InteractiveRepair;

impl RepairStrategy for InteractiveRepair {
    fn supply(
        &self,
        key: SettingsKey,
        current: Option<&str>,
        choices: &[Choice],
    ) -> Result<String> {
        let prompt = format!("{} ({}):", key.key().bold(), key.description());

        if !choices.is_empty() {
            let options: Vec<String> = choices
                .iter()
                .map(|c| match &c.description {
                    Some(d) => format!("{} - {}", c.value, d),
                    None => c.value.clone(),
                })
                .collect();
            let picked = Select::new(&prompt, options)
                .raw_prompt()
                .map_err(prompt_error)?;
            return Ok(choices[picked.index].value.clone());
        }

        if key.is_secret() {
            return Password::new(&prompt)
                .without_confirmation()
                .prompt()
                .map_err(prompt_error);
        }

        let mut text = Text::new(&prompt);
        if let Some(current) = current {
            text = text.with_initial_value(current);
        }
        text.prompt().map_err(prompt_error)
    }

    fn confirm_save(&self) -> Result<bool> {
        Confirm::new("Save the updated settings?")
            .with_default(true)
            .prompt()
            .map_err(prompt_error)
    }
}

/// Fails instead of prompting; for scripted use
pub struct NoRepair;

impl RepairStrategy for NoRepair {
    fn supply(
        &self,
        key: SettingsKey,
        _current: Option<&str>,
        _choices: &[Choice],
    ) -> Result<String> {
        Err(CliError::config(format!(
            "setting '{}' is missing or invalid and interactive repair is disabled",
            key.key()
        )))
    }

    fn confirm_save(&self) -> Result<bool> {
        Ok(false)
    }
}

fn prompt_error(err: inquire::InquireError) -> CliError {
    CliError::config(format!("prompt aborted: {}", err))
}
