//! CLI configuration: a thin wrapper around `kiwi_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` flag overrides
//! (--profile, --api-url, --insecure, --timeout, --output).

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use kiwi_core::{DashboardConfig, TlsVerification, TokenStore};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use kiwi_config::{
    Config, Profile, TokenStorage, config_path, load_config, load_config_or_default, save_config,
};

/// Everything a backend-bound command needs, resolved once per run.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub dashboard: DashboardConfig,
    pub token_storage: TokenStorage,
    pub output: OutputFormat,
}

impl Resolved {
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        kiwi_config::token_store(self.token_storage, &self.profile_name)
    }
}

/// Resolve against the config file on disk.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    resolve_from(&load_config_or_default(), global)
}

/// Translate a profile + global flags into a `DashboardConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_from(cfg: &Config, global: &GlobalOpts) -> Result<Resolved, CliError> {
    let (profile_name, mut profile) = cfg.resolve_profile(global.profile.as_deref())?;

    // 1. Backend URL (flag > env > profile)
    if let Some(ref url) = global.api_url {
        profile.api_url = Some(url.clone());
    }

    let mut dashboard = kiwi_config::profile_to_dashboard_config(&profile, &cfg.defaults)?;

    // 2. TLS verification
    if global.insecure {
        dashboard.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timeout
    if let Some(secs) = global.timeout {
        dashboard.timeout = Duration::from_secs(secs);
    }

    Ok(Resolved {
        profile_name,
        profile,
        dashboard,
        token_storage: cfg.defaults.token_storage,
        output: output_format(global, cfg),
    })
}

/// `--output` flag, else the config default, else table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or_else(|_| {
            tracing::warn!(value = %cfg.defaults.output, "unknown output format in config, using table");
            OutputFormat::Table
        })
    })
}
