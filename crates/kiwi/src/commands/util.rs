//! Shared helpers for command handlers.

use std::future::Future;
use std::io::{self, BufRead, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use kiwi_core::{AdminIdentity, Dashboard, DeviceId};

use crate::cli::GlobalOpts;
use crate::config::Resolved;
use crate::error::CliError;

/// Parse a device id argument.
pub fn device_id(raw: &str) -> Result<DeviceId, CliError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::Validation {
            field: "id".into(),
            reason: "device id cannot be empty".into(),
        });
    }
    Ok(DeviceId::new(trimmed))
}

/// Bring back the stored session, or explain how to get one.
pub async fn require_session(
    dashboard: &Dashboard,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<AdminIdentity, CliError> {
    with_spinner(global, "Checking session", dashboard.restore())
        .await
        .ok_or_else(|| CliError::NotLoggedIn {
            profile: resolved.profile_name.clone(),
        })
}

/// Run `fut` behind a stderr spinner when attached to a terminal.
pub async fn with_spinner<F: Future>(global: &GlobalOpts, message: &str, fut: F) -> F::Output {
    if global.quiet || !io::stderr().is_terminal() {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let output = fut.await;
    spinner.finish_and_clear();
    output
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, the operation is refused.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

/// Hidden password prompt.
pub fn prompt_secret(prompt: &str) -> Result<SecretString, CliError> {
    let value = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    Ok(SecretString::from(value))
}

/// First line of stdin, without its line ending.
pub fn read_stdin_line() -> Result<SecretString, CliError> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(SecretString::from(
        line.trim_end_matches(['\r', '\n']).to_owned(),
    ))
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
