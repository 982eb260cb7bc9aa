//! Shared configuration for the kiwi CLI.
//!
//! TOML profiles merged with `KIWI_` environment overrides, durable
//! credential storage (keyring, file, or memory), and translation to
//! `kiwi_core::DashboardConfig`. The CLI adds flag-aware wrappers on top.

mod tokens;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use kiwi_core::{DEFAULT_API_URL, DashboardConfig, MemoryTokenStore, TlsVerification, TokenStore};

pub use tokens::{FileTokenStore, KeyringTokenStore};

/// Profile used when none is named anywhere.
pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name and contents of the profile to use.
    ///
    /// An explicit name must exist. Without one, the configured default is
    /// used, falling back to built-in settings when the file has no such
    /// profile yet (first run).
    pub fn resolve_profile(
        &self,
        requested: Option<&str>,
    ) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = requested {
            return self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }

        let name = self
            .default_profile
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE.into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        Ok((name, profile))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub token_storage: TokenStorage,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            token_storage: TokenStorage::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// Where login credentials are kept between runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenStorage {
    /// Platform keychain.
    #[default]
    Keyring,
    /// A 0600 file under the data directory.
    File,
    /// Nothing is persisted; every run starts logged out.
    Memory,
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL. Defaults to the hosted registry.
    pub api_url: Option<String>,

    /// Administrator email, used as the login default.
    pub email: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification.
    pub insecure: Option<bool>,

    /// Override timeout (seconds, 0 disables).
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "kiwiwip", "kiwi")
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("kiwi");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for file-backed credentials.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file, then `KIWI_` environment overrides
/// (`KIWI_DEFAULTS__TIMEOUT=10`, `KIWI_PROFILES__LAB__API_URL=...`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KIWI_").split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile. No CLI flag overrides.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let raw = profile.api_url();
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(DashboardConfig {
        api_url: url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

/// The credential store for a profile.
pub fn token_store(kind: TokenStorage, profile_name: &str) -> Arc<dyn TokenStore> {
    match kind {
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::for_profile(profile_name)),
        TokenStorage::File => Arc::new(FileTokenStore::for_profile(&data_dir(), profile_name)),
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
    }
}
