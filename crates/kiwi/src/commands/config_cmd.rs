//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use kiwi_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, TokenStorage};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const STORAGE_CHOICES: [(TokenStorage, &str); 3] = [
    (TokenStorage::Keyring, "System keyring (recommended)"),
    (TokenStorage::File, "Private file in the data directory"),
    (TokenStorage::Memory, "Nowhere (log in on every run)"),
];

/// Render the merged config as TOML for the table and plain formats.
fn format_config(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# could not render config: {e}"))
}

/// Interactive wizard. Adds or replaces one profile and keeps the rest.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("kiwi configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(
            global
                .profile
                .clone()
                .unwrap_or_else(|| kiwi_config::DEFAULT_PROFILE.into()),
        )
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Backend URL
    let api_url: String = Input::new()
        .with_prompt("Backend URL")
        .default(DEFAULT_API_URL.into())
        .validate_with(|input: &String| -> Result<(), String> {
            match url::Url::parse(input) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
                Ok(u) => Err(format!("expected http or https, got '{}'", u.scheme())),
                Err(e) => Err(e.to_string()),
            }
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Login email
    let email: String = Input::new()
        .with_prompt("Administrator email (blank to ask at login)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    // 4. TLS
    let insecure = Confirm::new()
        .with_prompt("Accept invalid TLS certificates?")
        .default(false)
        .interact()
        .map_err(prompt_err)?;

    // 5. Token storage
    let labels: Vec<&str> = STORAGE_CHOICES.iter().map(|(_, label)| *label).collect();
    let current = STORAGE_CHOICES
        .iter()
        .position(|(kind, _)| *kind == cfg.defaults.token_storage)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Where should the session token be kept?")
        .items(&labels)
        .default(current)
        .interact()
        .map_err(prompt_err)?;
    if let Some((kind, _)) = STORAGE_CHOICES.get(selection) {
        cfg.defaults.token_storage = *kind;
    }

    let email = email.trim();
    let profile = Profile {
        api_url: (api_url != DEFAULT_API_URL).then_some(api_url),
        email: (!email.is_empty()).then(|| email.to_owned()),
        insecure: insecure.then_some(true),
        ..cfg.profiles.get(&profile_name).cloned().unwrap_or_default()
    };

    let first = cfg.profiles.is_empty();
    cfg.profiles.insert(profile_name.clone(), profile);
    if first {
        cfg.default_profile = Some(profile_name.clone());
    }

    config::save_config(&cfg)?;
    output::success(
        global,
        &format!(
            "Profile '{profile_name}' saved to {}\n  Next: kiwi login --profile {profile_name}",
            config_path.display()
        ),
    );
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = config::output_format(global, &cfg);
            let out = output::render_single(format, &cfg, format_config, format_config);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
