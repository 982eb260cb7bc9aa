//! Login, logout and whoami.

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use kiwi_core::{AdminIdentity, Dashboard, validate};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(admin: &AdminIdentity) -> String {
    [
        format!("Name:  {}", admin.name),
        format!("Email: {}", admin.email),
    ]
    .join("\n")
}

pub async fn login(
    dashboard: &Dashboard,
    args: LoginArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let email = match args.email.or_else(|| resolved.profile.email.clone()) {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };
    let email = validate::email(&email).map_err(|reason| CliError::Validation {
        field: "email".into(),
        reason,
    })?;

    let password: SecretString = if args.password_stdin {
        util::read_stdin_line()?
    } else {
        util::prompt_secret("Password: ")?
    };
    if password.expose_secret().is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }

    let session = dashboard.session();
    let admin = util::with_spinner(global, "Logging in", session.login(&email, &password)).await?;

    tracing::debug!(profile = %resolved.profile_name, "credential stored");
    output::success(
        global,
        &format!(
            "Logged in as {} <{}> (profile '{}')",
            admin.name, admin.email, resolved.profile_name
        ),
    );
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
pub fn logout(
    dashboard: &Dashboard,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    dashboard.logout();
    output::success(
        global,
        &format!("Logged out (profile '{}')", resolved.profile_name),
    );
    Ok(())
}

pub async fn whoami(
    dashboard: &Dashboard,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let admin = util::require_session(dashboard, resolved, global).await?;
    let out = output::render_single(resolved.output, &admin, detail, |a| a.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
