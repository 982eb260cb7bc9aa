//! Administrator profile handlers.

use kiwi_core::{Dashboard, PasswordForm, ProfileForm};

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    dashboard: &Dashboard,
    args: ProfileArgs,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProfileCommand::Update { name, email } => {
            let update = ProfileForm { name, email }.validate()?;
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: "nothing to update; pass --name and/or --email".into(),
                });
            }

            util::require_session(dashboard, resolved, global).await?;
            let admin =
                util::with_spinner(global, "Saving", dashboard.session().update_admin(&update))
                    .await?;

            let out = output::render_single(
                resolved.output,
                &admin,
                |a| format!("Name:  {}\nEmail: {}", a.name, a.email),
                |a| a.email.clone(),
            );
            output::print_output(&out, global.quiet);
            output::success(global, "Profile updated");
            Ok(())
        }

        ProfileCommand::Password => {
            util::require_session(dashboard, resolved, global).await?;

            let form = PasswordForm {
                current: util::prompt_secret("Current password: ")?,
                new: util::prompt_secret("New password: ")?,
                confirm: util::prompt_secret("Confirm new password: ")?,
            };
            form.validate()?;

            let session = dashboard.session();
            let changed = util::with_spinner(
                global,
                "Changing password",
                session.change_password(&form.current, &form.new, &form.confirm),
            )
            .await?;

            if changed {
                output::success(global, "Password changed");
                return Ok(());
            }
            Err(session
                .last_error()
                .map_or_else(|| CliError::Cancelled, CliError::from))
        }
    }
}
