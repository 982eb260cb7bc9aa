//! Command dispatch: bridges CLI args -> dashboard managers -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod profile;
pub mod util;

use kiwi_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(dashboard, args, resolved, global).await,
        Command::Logout => auth::logout(dashboard, resolved, global),
        Command::Whoami => auth::whoami(dashboard, resolved, global).await,
        Command::Profile(args) => profile::handle(dashboard, args, resolved, global).await,
        Command::Devices(args) => devices::handle(dashboard, args, resolved, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
